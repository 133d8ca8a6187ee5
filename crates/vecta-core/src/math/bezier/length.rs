use super::path::{Bezier, MultiBezier};
use crate::math::lerp;

/// Location on a multi-bezier resolved from a length ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthPosition {
    pub bezier: usize,
    pub segment: usize,
    pub t: f64,
}

#[derive(Debug, Clone)]
struct SegmentLength {
    length: f64,
    /// `(t, cumulative length)`, starting at `(0, 0)`
    samples: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
struct BezierLength {
    length: f64,
    segments: Vec<SegmentLength>,
}

/// Polyline approximation of arc length, sampled `steps` times per segment.
#[derive(Debug, Clone)]
pub struct LengthData {
    length: f64,
    beziers: Vec<BezierLength>,
}

impl LengthData {
    pub const DEFAULT_STEPS: usize = 5;

    pub fn new(shape: &MultiBezier, steps: usize) -> Self {
        let steps = steps.max(1);
        let beziers: Vec<_> = shape
            .beziers()
            .iter()
            .map(|b| Self::measure_bezier(b, steps))
            .collect();
        let length = beziers.iter().map(|b| b.length).sum();
        Self { length, beziers }
    }

    fn measure_bezier(bezier: &Bezier, steps: usize) -> BezierLength {
        let segments: Vec<_> = (0..bezier.segment_count())
            .map(|i| {
                let solver = bezier.segment(i);
                let mut samples = Vec::with_capacity(steps + 1);
                samples.push((0.0, 0.0));
                let mut previous = solver.solve(0.0);
                let mut length = 0.0;
                for step in 1..=steps {
                    let t = step as f64 / steps as f64;
                    let point = solver.solve(t);
                    length += point.distance(previous);
                    samples.push((t, length));
                    previous = point;
                }
                SegmentLength { length, samples }
            })
            .collect();
        let length = segments.iter().map(|s| s.length).sum();
        BezierLength { length, segments }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn bezier_length(&self, index: usize) -> f64 {
        self.beziers.get(index).map_or(0.0, |b| b.length)
    }

    /// Finds the point at `ratio` of the total length. `ratio` is clamped to
    /// [0, 1]; returns `None` when there are no segments at all.
    pub fn at_ratio(&self, ratio: f64) -> Option<LengthPosition> {
        let mut remaining = ratio.clamp(0.0, 1.0) * self.length;

        let measured: Vec<usize> = (0..self.beziers.len())
            .filter(|&i| !self.beziers[i].segments.is_empty())
            .collect();
        let last = *measured.last()?;

        for &bezier in &measured {
            let data = &self.beziers[bezier];
            if remaining > data.length && bezier != last {
                remaining -= data.length;
                continue;
            }

            let last_segment = data.segments.len() - 1;
            for (segment, seg) in data.segments.iter().enumerate() {
                if remaining > seg.length && segment != last_segment {
                    remaining -= seg.length;
                    continue;
                }
                return Some(LengthPosition {
                    bezier,
                    segment,
                    t: seg.t_at(remaining),
                });
            }
        }
        None
    }
}

impl SegmentLength {
    fn t_at(&self, length: f64) -> f64 {
        if self.length <= 0.0 {
            return 0.0;
        }
        if length >= self.length {
            return 1.0;
        }
        let index = self.samples.partition_point(|&(_, l)| l < length).max(1);
        let (t0, l0) = self.samples[index - 1];
        let (t1, l1) = self.samples[index];
        if l1 <= l0 {
            return t1;
        }
        lerp(t0, t1, (length - l0) / (l1 - l0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::DVec2;

    fn line(from: DVec2, to: DVec2) -> Bezier {
        let mut bez = Bezier::new();
        bez.push(crate::math::bezier::BezierPoint::new(from, from, from.lerp(to, 1.0 / 3.0), Default::default()));
        bez.push(crate::math::bezier::BezierPoint::new(to, from.lerp(to, 2.0 / 3.0), to, Default::default()));
        bez
    }

    #[test]
    fn straight_line_length_is_exact() {
        let shape = MultiBezier::from(line(DVec2::ZERO, DVec2::new(30.0, 40.0)));
        let data = LengthData::new(&shape, LengthData::DEFAULT_STEPS);
        assert_abs_diff_eq!(data.length(), 50.0, epsilon = 1e-9);

        let pos = data.at_ratio(0.5).unwrap();
        assert_eq!((pos.bezier, pos.segment), (0, 0));
        assert_abs_diff_eq!(pos.t, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn ratio_moves_across_beziers() {
        let shape: MultiBezier = vec![
            line(DVec2::ZERO, DVec2::new(10.0, 0.0)),
            Bezier::new(),
            line(DVec2::new(0.0, 5.0), DVec2::new(30.0, 5.0)),
        ]
        .into_iter()
        .collect();
        let data = LengthData::new(&shape, 5);
        assert_abs_diff_eq!(data.length(), 40.0, epsilon = 1e-9);

        let pos = data.at_ratio(0.625).unwrap();
        assert_eq!(pos.bezier, 2);
        assert_abs_diff_eq!(pos.t, 0.5, epsilon = 1e-9);

        let end = data.at_ratio(1.0).unwrap();
        assert_eq!(end.bezier, 2);
        assert_abs_diff_eq!(end.t, 1.0);
    }

    #[test]
    fn empty_shape_has_no_position() {
        let data = LengthData::new(&MultiBezier::new(), 5);
        assert!(data.at_ratio(0.5).is_none());
    }
}
