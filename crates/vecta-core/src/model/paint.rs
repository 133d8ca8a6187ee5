//! Painting contract: the document walks its nodes and hands styled paths
//! to a [`Painter`].

use super::document::Document;
use super::registry::{ObjectKind, RADIAL_GRADIENT};
use super::value::{Color, GradientStop};
use super::NodeId;
use crate::math::bezier::MultiBezier;
use crate::shapes::{collect_shapes, float_at, local_transform, point_at, siblings_of};
use crate::FrameTime;
use glam::{DAffine2, DVec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// Apply the node's own transform
    Transformed,
    NoTransform,
    /// Transformed, then every child in order
    Recursive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Gradient {
        kind: GradientKind,
        start: DVec2,
        end: DVec2,
        highlight: DVec2,
        stops: Vec<GradientStop>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaintStyle {
    pub brush: Brush,
    pub opacity: f64,
    /// Set for strokes
    pub stroke_width: Option<f64>,
}

/// Drawing backend. Calls to `save` and `restore` are balanced.
pub trait Painter {
    fn save(&mut self);
    fn restore(&mut self);
    fn transform(&mut self, matrix: DAffine2);
    fn draw_path(&mut self, path: &MultiBezier, style: &PaintStyle);

    fn multiply_opacity(&mut self, _opacity: f64) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Save,
    Restore,
    Transform(DAffine2),
    Opacity(f64),
    DrawPath { path: MultiBezier, style: PaintStyle },
}

/// Painter that keeps every call, for inspection.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub ops: Vec<PaintOp>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = (&MultiBezier, &PaintStyle)> {
        self.ops.iter().filter_map(|op| match op {
            PaintOp::DrawPath { path, style } => Some((path, style)),
            _ => None,
        })
    }
}

impl Painter for RecordingPainter {
    fn save(&mut self) {
        self.ops.push(PaintOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(PaintOp::Restore);
    }

    fn transform(&mut self, matrix: DAffine2) {
        self.ops.push(PaintOp::Transform(matrix));
    }

    fn draw_path(&mut self, path: &MultiBezier, style: &PaintStyle) {
        self.ops.push(PaintOp::DrawPath {
            path: path.clone(),
            style: style.clone(),
        });
    }

    fn multiply_opacity(&mut self, opacity: f64) {
        self.ops.push(PaintOp::Opacity(opacity));
    }
}

/// Brush of a fill or stroke, following its `use` asset if set.
pub fn styler_brush(doc: &Document, styler: NodeId, t: FrameTime) -> Brush {
    let own_color = || {
        doc.value_at(styler, "color", t)
            .and_then(|v| v.as_color())
            .unwrap_or(Color::BLACK)
    };
    let Some(asset) = doc.reference(styler, "use") else {
        return Brush::Solid(own_color());
    };
    match doc.object(asset).map(|o| o.kind()) {
        Some(ObjectKind::NamedColor) => Brush::Solid(
            doc.value_at(asset, "color", t)
                .and_then(|v| v.as_color())
                .unwrap_or(Color::BLACK),
        ),
        Some(ObjectKind::Gradient) => {
            let stops = doc
                .reference(asset, "colors")
                .and_then(|colors| doc.value_at(colors, "colors", t))
                .and_then(|v| v.as_gradient().map(<[GradientStop]>::to_vec))
                .unwrap_or_default();
            let kind = match doc.get(asset, "type").and_then(|v| v.as_i64()) {
                Some(RADIAL_GRADIENT) => GradientKind::Radial,
                _ => GradientKind::Linear,
            };
            Brush::Gradient {
                kind,
                start: point_at(doc, asset, "start_point", t, DVec2::ZERO),
                end: point_at(doc, asset, "end_point", t, DVec2::ZERO),
                highlight: point_at(doc, asset, "highlight", t, DVec2::ZERO),
                stops,
            }
        }
        _ => Brush::Solid(own_color()),
    }
}

const MAX_PAINT_DEPTH: usize = 64;

impl Document {
    /// Paints `id` inside a save/restore pair so nothing leaks to siblings.
    pub fn paint(&self, id: NodeId, painter: &mut dyn Painter, t: FrameTime, mode: PaintMode) {
        self.paint_depth(id, painter, t, mode, 0);
    }

    fn paint_depth(&self, id: NodeId, painter: &mut dyn Painter, t: FrameTime, mode: PaintMode, depth: usize) {
        if depth > MAX_PAINT_DEPTH || !self.is_visible(id) {
            return;
        }
        let Some(object) = self.object(id) else {
            return;
        };
        if object.kind() == ObjectKind::Layer && object.get_bool("render") == Some(false) {
            return;
        }

        painter.save();
        if mode != PaintMode::NoTransform {
            let matrix = local_transform(self, id, t);
            if matrix != DAffine2::IDENTITY {
                painter.transform(matrix);
            }
        }
        self.on_paint(id, painter, t, depth);
        if mode == PaintMode::Recursive {
            for child in self.children(id) {
                self.paint_depth(child, painter, t, mode, depth + 1);
            }
        }
        painter.restore();
    }

    fn on_paint(&self, id: NodeId, painter: &mut dyn Painter, t: FrameTime, depth: usize) {
        let Some(kind) = self.object(id).map(|o| o.kind()) else {
            return;
        };
        match kind {
            ObjectKind::Fill | ObjectKind::Stroke => {
                let Some((siblings, index)) = siblings_of(self, id) else {
                    return;
                };
                let path = collect_shapes(self, siblings, index + 1, t);
                if path.is_empty() {
                    return;
                }
                let style = PaintStyle {
                    brush: styler_brush(self, id, t),
                    opacity: float_at(self, id, "opacity", t, 1.0),
                    stroke_width: (kind == ObjectKind::Stroke)
                        .then(|| float_at(self, id, "width", t, 1.0)),
                };
                painter.draw_path(&path, &style);
            }
            ObjectKind::Group | ObjectKind::Layer => {
                let opacity = float_at(self, id, "opacity", t, 1.0);
                if opacity < 1.0 {
                    painter.multiply_opacity(opacity);
                }
            }
            ObjectKind::PreCompLayer => {
                let opacity = float_at(self, id, "opacity", t, 1.0);
                if opacity < 1.0 {
                    painter.multiply_opacity(opacity);
                }
                if let Some(composition) = self.reference(id, "composition") {
                    self.paint_depth(composition, painter, t, PaintMode::Recursive, depth + 1);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Value;
    use kurbo::Size;

    fn add(doc: &mut Document, owner: NodeId, type_name: &str) -> NodeId {
        let id = doc.create(type_name).unwrap();
        assert!(doc.insert(owner, "shapes", id, None));
        id
    }

    #[test]
    fn stylers_draw_following_shapes() {
        let mut doc = Document::new();
        let main = doc.main();
        let group = add(&mut doc, main, "Group");
        let rect = add(&mut doc, group, "Rect");
        let fill = add(&mut doc, group, "Fill");
        let ellipse = add(&mut doc, group, "Ellipse");
        doc.set(rect, "size", Value::Size(Size::new(4.0, 4.0)));
        doc.set(ellipse, "size", Value::Size(Size::new(2.0, 2.0)));
        doc.set(fill, "color", Value::Color(Color::rgb(0, 0, 255)));

        let mut painter = RecordingPainter::new();
        doc.paint(main, &mut painter, 0.0, PaintMode::Recursive);

        let calls: Vec<_> = painter.draw_calls().collect();
        assert_eq!(calls.len(), 1);
        let (path, style) = calls[0];
        assert_eq!(path.len(), 1, "only the ellipse follows the fill");
        assert_eq!(style.brush, Brush::Solid(Color::rgb(0, 0, 255)));
        assert_eq!(style.stroke_width, None);

        let saves = painter.ops.iter().filter(|op| **op == PaintOp::Save).count();
        let restores = painter.ops.iter().filter(|op| **op == PaintOp::Restore).count();
        assert_eq!(saves, restores);
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let mut doc = Document::new();
        let main = doc.main();
        let fill = add(&mut doc, main, "Fill");
        add(&mut doc, main, "Ellipse");
        doc.set_visible(fill, false);

        let mut painter = RecordingPainter::new();
        doc.paint(main, &mut painter, 0.0, PaintMode::Recursive);
        assert_eq!(painter.draw_calls().count(), 0);
    }

    #[test]
    fn named_color_brush() {
        let mut doc = Document::new();
        let main = doc.main();
        let colors = doc.sub_object(doc.assets(), "colors").unwrap();
        let named = doc.create("NamedColor").unwrap();
        doc.set(named, "color", Value::Color(Color::rgb(1, 2, 3)));
        assert!(doc.insert(colors, "values", named, None));

        let stroke = add(&mut doc, main, "Stroke");
        assert!(doc.set_reference(stroke, "use", Some(named)));
        assert_eq!(styler_brush(&doc, stroke, 0.0), Brush::Solid(Color::rgb(1, 2, 3)));
    }
}
