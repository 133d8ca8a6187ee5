//! Geometry of shape nodes: beziers, transforms and bounds at a given time.

pub mod trim;

pub use trim::{trim, trim_path, TrimMultiple};

use crate::math::bezier::{Bezier, BezierPoint, MultiBezier, PointType, KAPPA};
use crate::math::from_polar;
use crate::model::registry::{ObjectKind, POLYGON};
use crate::model::{Document, NodeId, Value};
use crate::FrameTime;
use glam::{DAffine2, DVec2};
use kurbo::{Rect, Size};
use std::f64::consts::{PI, TAU};

pub(crate) fn float_at(doc: &Document, id: NodeId, name: &str, t: FrameTime, default: f64) -> f64 {
    doc.value_at(id, name, t)
        .and_then(|v| v.as_f64())
        .unwrap_or(default)
}

pub(crate) fn point_at(doc: &Document, id: NodeId, name: &str, t: FrameTime, default: DVec2) -> DVec2 {
    doc.value_at(id, name, t)
        .and_then(|v| v.as_point())
        .unwrap_or(default)
}

fn size_at(doc: &Document, id: NodeId, name: &str, t: FrameTime) -> Size {
    doc.value_at(id, name, t)
        .and_then(|v| v.as_size())
        .unwrap_or(Size::ZERO)
}

/// Matrix of a Transform object: translate, rotate (degrees), scale, then
/// move the anchor to the origin.
pub fn transform_matrix(doc: &Document, transform: NodeId, t: FrameTime) -> DAffine2 {
    let anchor = point_at(doc, transform, "anchor_point", t, DVec2::ZERO);
    let position = point_at(doc, transform, "position", t, DVec2::ZERO);
    let scale = point_at(doc, transform, "scale", t, DVec2::ONE);
    let rotation = float_at(doc, transform, "rotation", t, 0.0);
    DAffine2::from_translation(position)
        * DAffine2::from_angle(rotation.to_radians())
        * DAffine2::from_scale(scale)
        * DAffine2::from_translation(-anchor)
}

/// Transform a node applies to its contents.
pub fn local_transform(doc: &Document, id: NodeId, t: FrameTime) -> DAffine2 {
    doc.sub_object(id, "transform")
        .map_or(DAffine2::IDENTITY, |transform| transform_matrix(doc, transform, t))
}

/// Path of a shape node, `None` for anything that is not a shape.
pub fn shape_bezier(doc: &Document, id: NodeId, t: FrameTime) -> Option<Bezier> {
    let object = doc.object(id)?;
    let bezier = match object.kind() {
        ObjectKind::Rect => rect_bezier(
            point_at(doc, id, "position", t, DVec2::ZERO),
            size_at(doc, id, "size", t),
            float_at(doc, id, "rounded", t, 0.0),
        ),
        ObjectKind::Ellipse => ellipse_bezier(
            point_at(doc, id, "position", t, DVec2::ZERO),
            size_at(doc, id, "size", t),
        ),
        ObjectKind::PolyStar => {
            let star = doc.get(id, "type").and_then(|v| v.as_i64()) != Some(POLYGON);
            polystar_bezier(&PolyStar {
                center: point_at(doc, id, "position", t, DVec2::ZERO),
                points: float_at(doc, id, "points", t, 5.0),
                outer_radius: float_at(doc, id, "outer_radius", t, 0.0),
                inner_radius: float_at(doc, id, "inner_radius", t, 0.0),
                outer_roundness: float_at(doc, id, "outer_roundness", t, 0.0),
                inner_roundness: float_at(doc, id, "inner_roundness", t, 0.0),
                angle: float_at(doc, id, "angle", t, 0.0),
                star,
            })
        }
        ObjectKind::Path => {
            let mut bezier = match doc.value_at(id, "shape", t) {
                Some(Value::Bezier(bezier)) => bezier,
                _ => Bezier::new(),
            };
            if object.get_bool("closed") == Some(true) {
                bezier.set_closed(true);
            }
            bezier
        }
        _ => return None,
    };

    if object.get_bool("reversed") == Some(true) {
        Some(bezier.reversed())
    } else {
        Some(bezier)
    }
}

/// Rectangle centred on `center`, clockwise from the top right corner.
pub fn rect_bezier(center: DVec2, size: Size, rounded: f64) -> Bezier {
    let half = DVec2::new(size.width, size.height) / 2.0;
    let corners = [
        center + DVec2::new(half.x, -half.y),
        center + half,
        center + DVec2::new(-half.x, half.y),
        center - half,
    ];
    let radius = rounded.min(half.x.abs()).min(half.y.abs()).max(0.0);

    let mut bezier = Bezier::new();
    bezier.set_closed(true);
    if radius <= 0.0 {
        for corner in corners {
            bezier.add_point(corner);
        }
        return bezier;
    }

    let toward = |from: DVec2, to: DVec2| from + (to - from).normalize_or_zero() * radius;
    let leave = |index: usize| {
        let corner = corners[index];
        let pos = toward(corner, corners[(index + 1) % 4]);
        BezierPoint::new(pos, pos + (corner - pos) * KAPPA, pos, PointType::Smooth)
    };
    let arrive = |index: usize| {
        let corner = corners[index];
        let pos = toward(corner, corners[(index + 3) % 4]);
        BezierPoint::new(pos, pos, pos + (corner - pos) * KAPPA, PointType::Smooth)
    };

    bezier.push(leave(0));
    for index in 1..4 {
        bezier.push(arrive(index));
        bezier.push(leave(index));
    }
    bezier.push(arrive(0));
    bezier
}

/// Ellipse inscribed in `size`, clockwise from the top.
pub fn ellipse_bezier(center: DVec2, size: Size) -> Bezier {
    let rx = size.width / 2.0;
    let ry = size.height / 2.0;
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let point = |pos: DVec2, tan: DVec2| {
        BezierPoint::new(center + pos, center + pos - tan, center + pos + tan, PointType::Smooth)
    };
    Bezier::from_points(
        vec![
            point(DVec2::new(0.0, -ry), DVec2::new(kx, 0.0)),
            point(DVec2::new(rx, 0.0), DVec2::new(0.0, ky)),
            point(DVec2::new(0.0, ry), DVec2::new(-kx, 0.0)),
            point(DVec2::new(-rx, 0.0), DVec2::new(0.0, -ky)),
        ],
        true,
    )
}

#[derive(Debug, Clone, Copy)]
pub struct PolyStar {
    pub center: DVec2,
    pub points: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub outer_roundness: f64,
    pub inner_roundness: f64,
    /// Degrees, 0 points the first vertex up
    pub angle: f64,
    pub star: bool,
}

/// Upper bound on the point count of a polygon or star.
pub const MAX_POLYSTAR_POINTS: usize = 1000;

pub fn polystar_bezier(shape: &PolyStar) -> Bezier {
    let points = shape.points.round().max(3.0).min(MAX_POLYSTAR_POINTS as f64) as usize;
    let vertices = if shape.star { points.saturating_mul(2) } else { points };
    let step = TAU / vertices as f64;
    let start = shape.angle.to_radians() - PI / 2.0;

    let mut bezier = Bezier::new();
    bezier.set_closed(true);
    for index in 0..vertices {
        let inner = shape.star && index % 2 == 1;
        let (radius, roundness) = if inner {
            (shape.inner_radius, shape.inner_roundness)
        } else {
            (shape.outer_radius, shape.outer_roundness)
        };
        let angle = start + step * index as f64;
        let pos = shape.center + from_polar(radius, angle);
        let tangent = from_polar(radius * roundness * step / 2.0, angle + PI / 2.0);
        let kind = if roundness == 0.0 {
            PointType::Corner
        } else {
            PointType::Symmetrical
        };
        bezier.push(BezierPoint::new(pos, pos - tangent, pos + tangent, kind));
    }
    bezier
}

/// Paths of `siblings[from..]` in local coordinates. Groups contribute
/// their transformed contents; a trim modifier consumes the siblings after
/// it and ends the scan.
pub fn collect_shapes(doc: &Document, siblings: &[NodeId], from: usize, t: FrameTime) -> MultiBezier {
    let mut out = MultiBezier::new();
    for (index, &id) in siblings.iter().enumerate().skip(from) {
        if !doc.is_visible(id) {
            continue;
        }
        let Some(kind) = doc.object(id).map(|o| o.kind()) else {
            continue;
        };
        match kind {
            ObjectKind::Group | ObjectKind::Layer => {
                let inner = collect_shapes(doc, doc.items(id, "shapes"), 0, t);
                out.append(inner.transformed(&local_transform(doc, id, t)));
            }
            ObjectKind::Trim => {
                let rest = collect_shapes(doc, siblings, index + 1, t);
                let multiple = doc
                    .get(id, "multiple")
                    .and_then(|v| v.as_i64())
                    .map_or(TrimMultiple::default(), TrimMultiple::from_i64);
                out.append(trim(
                    &rest,
                    float_at(doc, id, "start", t, 0.0),
                    float_at(doc, id, "end", t, 1.0),
                    float_at(doc, id, "offset", t, 0.0),
                    multiple,
                ));
                break;
            }
            kind if kind.is_shape() => {
                if let Some(bezier) = shape_bezier(doc, id, t) {
                    out.push(bezier);
                }
            }
            _ => {}
        }
    }
    out
}

/// Index of `id` among its owner's list and the list itself.
pub(crate) fn siblings_of(doc: &Document, id: NodeId) -> Option<(&[NodeId], usize)> {
    let owner = doc.parent(id)?;
    let siblings = doc.items(owner, "shapes");
    let index = siblings.iter().position(|&s| s == id)?;
    Some((siblings, index))
}

/// Bounds in the node's own coordinate system.
pub fn local_bounding_rect(doc: &Document, id: NodeId, t: FrameTime) -> Option<Rect> {
    let object = doc.object(id)?;
    match object.kind() {
        ObjectKind::Group | ObjectKind::Layer => collect_shapes(doc, doc.items(id, "shapes"), 0, t)
            .transformed(&local_transform(doc, id, t))
            .bounding_box(),
        ObjectKind::Composition => collect_shapes(doc, doc.items(id, "shapes"), 0, t).bounding_box(),
        ObjectKind::PreCompLayer => {
            let size = doc.get(id, "size").and_then(|v| v.as_size())?;
            let matrix = local_transform(doc, id, t);
            let corners = [
                DVec2::ZERO,
                DVec2::new(size.width, 0.0),
                DVec2::new(size.width, size.height),
                DVec2::new(0.0, size.height),
            ]
            .map(|p| matrix.transform_point2(p));
            let min = corners.iter().fold(corners[0], |a, &b| a.min(b));
            let max = corners.iter().fold(corners[0], |a, &b| a.max(b));
            Some(Rect::new(min.x, min.y, max.x, max.y))
        }
        ObjectKind::Fill | ObjectKind::Stroke => {
            let (siblings, index) = siblings_of(doc, id)?;
            let rect = collect_shapes(doc, siblings, index + 1, t).bounding_box()?;
            if object.kind() == ObjectKind::Stroke {
                let half = float_at(doc, id, "width", t, 0.0) / 2.0;
                Some(rect.inflate(half, half))
            } else {
                Some(rect)
            }
        }
        kind if kind.is_shape() => shape_bezier(doc, id, t)?.bounding_box(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn add(doc: &mut Document, owner: NodeId, type_name: &str) -> NodeId {
        let id = doc.create(type_name).unwrap();
        assert!(doc.insert(owner, "shapes", id, None));
        id
    }

    #[test]
    fn rect_corners() {
        let bezier = rect_bezier(DVec2::new(10.0, 10.0), Size::new(20.0, 10.0), 0.0);
        let points: Vec<_> = bezier.points().iter().map(|p| p.pos).collect();
        assert_eq!(
            points,
            vec![
                DVec2::new(20.0, 5.0),
                DVec2::new(20.0, 15.0),
                DVec2::new(0.0, 15.0),
                DVec2::new(0.0, 5.0),
            ]
        );
        assert!(bezier.closed());

        let rounded = rect_bezier(DVec2::ZERO, Size::new(20.0, 10.0), 100.0);
        assert_eq!(rounded.len(), 8);
        let rect = rounded.bounding_box().unwrap();
        assert_abs_diff_eq!(rect.x0, -10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.y1, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn polystar_point_count_is_bounded() {
        let shape = PolyStar {
            center: DVec2::ZERO,
            points: 1e19,
            outer_radius: 10.0,
            inner_radius: 5.0,
            outer_roundness: 0.0,
            inner_roundness: 0.0,
            angle: 0.0,
            star: true,
        };
        assert_eq!(polystar_bezier(&shape).len(), MAX_POLYSTAR_POINTS * 2);

        let polygon = PolyStar { star: false, points: f64::INFINITY, ..shape };
        assert_eq!(polystar_bezier(&polygon).len(), MAX_POLYSTAR_POINTS);

        let degenerate = PolyStar { points: f64::NAN, ..polygon };
        assert_eq!(polystar_bezier(&degenerate).len(), 3);
    }

    #[test]
    fn ellipse_bounds_match_size() {
        let rect = ellipse_bezier(DVec2::new(5.0, 5.0), Size::new(10.0, 4.0))
            .bounding_box()
            .unwrap();
        assert_abs_diff_eq!(rect.x0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.x1, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.y0, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.y1, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn star_alternates_radii() {
        let bezier = polystar_bezier(&PolyStar {
            center: DVec2::ZERO,
            points: 5.0,
            outer_radius: 10.0,
            inner_radius: 4.0,
            outer_roundness: 0.0,
            inner_roundness: 0.0,
            angle: 0.0,
            star: true,
        });
        assert_eq!(bezier.len(), 10);
        assert_abs_diff_eq!(bezier.points()[0].pos.y, -10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bezier.points()[1].pos.length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn group_transform_applies_to_children() {
        let mut doc = Document::new();
        let main = doc.main();
        let group = add(&mut doc, main, "Group");
        let rect = add(&mut doc, group, "Rect");
        doc.set(rect, "size", Value::Size(Size::new(10.0, 10.0)));
        let transform = doc.sub_object(group, "transform").unwrap();
        doc.set(transform, "position", Value::Point(DVec2::new(100.0, 0.0)));
        doc.set(transform, "scale", Value::Point(DVec2::new(2.0, 2.0)));

        let rect_bounds = local_bounding_rect(&doc, group, 0.0).unwrap();
        assert_abs_diff_eq!(rect_bounds.x0, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect_bounds.x1, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn trim_consumes_following_siblings() {
        let mut doc = Document::new();
        let main = doc.main();
        let trim = add(&mut doc, main, "Trim");
        let ellipse = add(&mut doc, main, "Ellipse");
        doc.set(ellipse, "size", Value::Size(Size::new(10.0, 10.0)));
        doc.set(trim, "end", Value::Float(0.5));

        let shapes = collect_shapes(&doc, doc.items(main, "shapes"), 0, 0.0);
        assert_eq!(shapes.len(), 1);
        assert!(!shapes.beziers()[0].closed());

        doc.set_visible(trim, false);
        let shapes = collect_shapes(&doc, doc.items(main, "shapes"), 0, 0.0);
        assert!(shapes.beziers()[0].closed());
    }
}
