//! Trim path: keeps the part of a path between two length ratios.

use crate::math::bezier::{Bezier, LengthData, LengthPosition, MultiBezier};
use crate::math::{fmod, EPSILON};
use crate::model::registry::{TRIM_INDIVIDUALLY, TRIM_SIMULTANEOUSLY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMultiple {
    /// Every bezier is trimmed on its own with the same parameters
    #[default]
    Simultaneously,
    /// All beziers are trimmed as one continuous path
    Individually,
}

impl TrimMultiple {
    pub fn from_i64(value: i64) -> Self {
        if value == TRIM_INDIVIDUALLY {
            TrimMultiple::Individually
        } else {
            TrimMultiple::Simultaneously
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            TrimMultiple::Simultaneously => TRIM_SIMULTANEOUSLY,
            TrimMultiple::Individually => TRIM_INDIVIDUALLY,
        }
    }
}

pub fn trim(shape: &MultiBezier, start: f64, end: f64, offset: f64, multiple: TrimMultiple) -> MultiBezier {
    match multiple {
        TrimMultiple::Individually => trim_path(shape, start, end, offset),
        TrimMultiple::Simultaneously => shape
            .beziers()
            .iter()
            .flat_map(|bezier| {
                trim_path(&MultiBezier::from(bezier.clone()), start, end, offset)
                    .beziers()
                    .to_vec()
            })
            .collect(),
    }
}

/// Trims `shape` as a single path. `start`, `end` and `offset` are length
/// ratios; when the shifted range wraps around, the tail comes before the head.
pub fn trim_path(shape: &MultiBezier, start: f64, end: f64, offset: f64) -> MultiBezier {
    if shape.is_empty() || (end - start).abs() < EPSILON {
        return MultiBezier::new();
    }
    if end - start >= 1.0 {
        return shape.clone();
    }

    let start = fmod(start + offset, 1.0);
    let mut end = fmod(end + offset, 1.0);
    if end == 0.0 {
        end = 1.0;
    }
    if start == 0.0 && end == 1.0 {
        return shape.clone();
    }

    let length_data = LengthData::new(shape, LengthData::DEFAULT_STEPS);
    let (Some(from), Some(to)) = (length_data.at_ratio(start), length_data.at_ratio(end)) else {
        return MultiBezier::new();
    };

    let beziers = shape.beziers();
    let mut out = MultiBezier::new();
    if start < end {
        if from.bezier == to.bezier {
            out.push(beziers[from.bezier].sub_path((from.segment, from.t), (to.segment, to.t)));
            return out;
        }
        out.push(tail(&beziers[from.bezier], from));
        for bezier in &beziers[from.bezier + 1..to.bezier] {
            out.push(bezier.clone());
        }
        out.push(head(&beziers[to.bezier], to));
    } else {
        out.push(tail(&beziers[from.bezier], from));
        for bezier in &beziers[from.bezier + 1..] {
            out.push(bezier.clone());
        }
        for bezier in &beziers[..to.bezier] {
            out.push(bezier.clone());
        }
        out.push(head(&beziers[to.bezier], to));
    }
    out
}

fn tail(bezier: &Bezier, from: LengthPosition) -> Bezier {
    let last = bezier.segment_count().saturating_sub(1);
    bezier.sub_path((from.segment, from.t), (last, 1.0))
}

fn head(bezier: &Bezier, to: LengthPosition) -> Bezier {
    bezier.sub_path((0, 0.0), (to.segment, to.t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::bezier::{BezierPoint, PointType};
    use approx::assert_abs_diff_eq;
    use glam::DVec2;

    /// Straight line parametrized by arc length.
    fn line(from: DVec2, to: DVec2) -> Bezier {
        let third = (to - from) / 3.0;
        Bezier::from_points(
            vec![
                BezierPoint::new(from, from, from + third, PointType::Corner),
                BezierPoint::new(to, to - third, to, PointType::Corner),
            ],
            false,
        )
    }

    fn ends(bezier: &Bezier) -> (DVec2, DVec2) {
        let points = bezier.points();
        (points[0].pos, points[points.len() - 1].pos)
    }

    fn assert_point(actual: DVec2, expected: DVec2) {
        assert_abs_diff_eq!(actual.x, expected.x, epsilon = 1e-6);
        assert_abs_diff_eq!(actual.y, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn middle_of_a_line() {
        let shape = MultiBezier::from(line(DVec2::ZERO, DVec2::new(10.0, 0.0)));
        let out = trim_path(&shape, 0.25, 0.75, 0.0);
        assert_eq!(out.len(), 1);
        let (a, b) = ends(&out.beziers()[0]);
        assert_point(a, DVec2::new(2.5, 0.0));
        assert_point(b, DVec2::new(7.5, 0.0));
    }

    #[test]
    fn empty_and_full_ranges() {
        let shape = MultiBezier::from(line(DVec2::ZERO, DVec2::new(10.0, 0.0)));
        assert!(trim_path(&shape, 0.4, 0.4, 0.0).is_empty());
        assert_eq!(trim_path(&shape, 0.0, 1.0, 0.3), shape);
        assert!(trim_path(&MultiBezier::new(), 0.0, 0.5, 0.0).is_empty());
    }

    #[test]
    fn offset_wraps_tail_then_head() {
        let shape = MultiBezier::from(line(DVec2::ZERO, DVec2::new(10.0, 0.0)));
        let out = trim_path(&shape, 0.0, 0.5, 0.75);
        assert_eq!(out.len(), 2);
        let (a, b) = ends(&out.beziers()[0]);
        assert_point(a, DVec2::new(7.5, 0.0));
        assert_point(b, DVec2::new(10.0, 0.0));
        let (a, b) = ends(&out.beziers()[1]);
        assert_point(a, DVec2::ZERO);
        assert_point(b, DVec2::new(2.5, 0.0));
    }

    #[test]
    fn multiple_modes() {
        let shape: MultiBezier = [
            line(DVec2::ZERO, DVec2::new(10.0, 0.0)),
            line(DVec2::new(0.0, 5.0), DVec2::new(10.0, 5.0)),
        ]
        .into_iter()
        .collect();

        let joined = trim(&shape, 0.25, 0.75, 0.0, TrimMultiple::Individually);
        assert_eq!(joined.len(), 2);
        let (a, b) = ends(&joined.beziers()[0]);
        assert_point(a, DVec2::new(5.0, 0.0));
        assert_point(b, DVec2::new(10.0, 0.0));
        let (a, b) = ends(&joined.beziers()[1]);
        assert_point(a, DVec2::new(0.0, 5.0));
        assert_point(b, DVec2::new(5.0, 5.0));

        let each = trim(&shape, 0.25, 0.75, 0.0, TrimMultiple::Simultaneously);
        assert_eq!(each.len(), 2);
        let (a, b) = ends(&each.beziers()[1]);
        assert_point(a, DVec2::new(2.5, 5.0));
        assert_point(b, DVec2::new(7.5, 5.0));
    }
}
