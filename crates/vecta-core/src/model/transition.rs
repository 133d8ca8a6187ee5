//! Easing between two keyframes.

use crate::math::bezier::CubicBezierSolver;
use glam::DVec2;

/// Coarse classification of a transition, as shown in editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptive {
    Hold,
    Linear,
    Ease,
    Custom,
}

const EASE_BEFORE: DVec2 = DVec2::new(1.0 / 3.0, 0.0);
const EASE_AFTER: DVec2 = DVec2::new(2.0 / 3.0, 1.0);
const TOLERANCE: f64 = 1e-12;

/// Timing curve from one keyframe to the next.
///
/// The curve goes from (0, 0) to (1, 1). X is elapsed time ratio, y is the
/// interpolation factor. `before` is the outgoing handle of the first
/// keyframe and `after` the incoming handle of the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeTransition {
    bezier: CubicBezierSolver<DVec2>,
    hold: bool,
}

impl Default for KeyframeTransition {
    fn default() -> Self {
        Self::new(DVec2::ZERO, DVec2::ONE)
    }
}

impl KeyframeTransition {
    pub fn new(before: DVec2, after: DVec2) -> Self {
        Self {
            bezier: CubicBezierSolver::new(DVec2::ZERO, before, after, DVec2::ONE),
            hold: false,
        }
    }

    pub fn hold() -> Self {
        Self {
            hold: true,
            ..Self::default()
        }
    }

    pub fn ease() -> Self {
        Self::new(EASE_BEFORE, EASE_AFTER)
    }

    pub fn is_hold(&self) -> bool {
        self.hold
    }

    pub fn set_hold(&mut self, hold: bool) {
        self.hold = hold;
    }

    pub fn before_handle(&self) -> DVec2 {
        self.bezier.points()[1]
    }

    pub fn after_handle(&self) -> DVec2 {
        self.bezier.points()[2]
    }

    pub fn set_before_handle(&mut self, handle: DVec2) {
        let mut points = *self.bezier.points();
        points[1] = handle;
        self.bezier.set_points(points);
    }

    pub fn set_after_handle(&mut self, handle: DVec2) {
        let mut points = *self.bezier.points();
        points[2] = handle;
        self.bezier.set_points(points);
    }

    pub fn set_handles(&mut self, before: DVec2, after: DVec2) {
        self.bezier
            .set_points([DVec2::ZERO, before, after, DVec2::ONE]);
    }

    pub fn bezier(&self) -> &CubicBezierSolver<DVec2> {
        &self.bezier
    }

    pub fn descriptive(&self) -> Descriptive {
        if self.hold {
            return Descriptive::Hold;
        }
        let before = self.before_handle();
        let after = self.after_handle();
        let on_diagonal = |p: DVec2| (p.x - p.y).abs() < 1e-9;
        if on_diagonal(before) && on_diagonal(after) {
            Descriptive::Linear
        } else if before.abs_diff_eq(EASE_BEFORE, 1e-9) && after.abs_diff_eq(EASE_AFTER, 1e-9) {
            Descriptive::Ease
        } else {
            Descriptive::Custom
        }
    }

    /// Curve parameter whose x coordinate equals `ratio`.
    pub fn bezier_parameter(&self, ratio: f64) -> f64 {
        if ratio <= 0.0 {
            return 0.0;
        }
        if ratio >= 1.0 {
            return 1.0;
        }

        let mut t = ratio;
        for _ in 0..8 {
            if !(0.0..=1.0).contains(&t) {
                break;
            }
            let err = self.bezier.solve_component(t, 0) - ratio;
            if err.abs() < TOLERANCE {
                return t;
            }
            let slope = self.bezier.derivative(t, 0);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= err / slope;
        }

        // x is monotonic on [0, 1] for handles inside the unit square
        let (mut low, mut high) = (0.0, 1.0);
        t = ratio;
        for _ in 0..64 {
            let x = self.bezier.solve_component(t, 0);
            if (x - ratio).abs() < TOLERANCE {
                break;
            }
            if x < ratio {
                low = t;
            } else {
                high = t;
            }
            t = (low + high) / 2.0;
        }
        t
    }

    /// Interpolation factor to use at the given time ratio.
    pub fn lerp_factor(&self, ratio: f64) -> f64 {
        if self.hold {
            return 0.0;
        }
        if ratio <= 0.0 {
            return 0.0;
        }
        if ratio >= 1.0 {
            return 1.0;
        }
        self.bezier.solve_component(self.bezier_parameter(ratio), 1)
    }

    /// Splits into the transitions before and after time ratio `x`,
    /// each rescaled to the unit square.
    pub fn split(&self, x: f64) -> (KeyframeTransition, KeyframeTransition) {
        if self.hold {
            return (Self::hold(), Self::hold());
        }

        let t = self.bezier_parameter(x);
        let (left, right) = self.bezier.split(t);
        let mid = left[3];

        let normalize = |p: DVec2, origin: DVec2, extent: DVec2| {
            let axis = |v: f64, o: f64, e: f64| if e.abs() < 1e-12 { v } else { (v - o) / e };
            DVec2::new(axis(p.x, origin.x, extent.x), axis(p.y, origin.y, extent.y))
        };

        let left_extent = mid;
        let right_extent = DVec2::ONE - mid;
        (
            KeyframeTransition::new(
                normalize(left[1], DVec2::ZERO, left_extent),
                normalize(left[2], DVec2::ZERO, left_extent),
            ),
            KeyframeTransition::new(
                normalize(right[1], mid, right_extent),
                normalize(right[2], mid, right_extent),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_by_default() {
        let transition = KeyframeTransition::default();
        assert_eq!(transition.descriptive(), Descriptive::Linear);
        assert_abs_diff_eq!(transition.lerp_factor(0.25), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(transition.lerp_factor(0.8), 0.8, epsilon = 1e-9);
    }

    #[test]
    fn hold_stays_at_start() {
        let transition = KeyframeTransition::hold();
        assert_eq!(transition.descriptive(), Descriptive::Hold);
        assert_eq!(transition.lerp_factor(0.99), 0.0);
    }

    #[test]
    fn ease_is_symmetric() {
        let transition = KeyframeTransition::ease();
        assert_eq!(transition.descriptive(), Descriptive::Ease);
        assert_abs_diff_eq!(transition.lerp_factor(0.5), 0.5, epsilon = 1e-9);
        assert!(transition.lerp_factor(0.25) < 0.25);
        assert!(transition.lerp_factor(0.75) > 0.75);
    }

    #[test]
    fn parameter_inverts_x() {
        let transition = KeyframeTransition::new(DVec2::new(0.9, 0.1), DVec2::new(0.1, 0.9));
        for i in 1..10 {
            let ratio = i as f64 / 10.0;
            let t = transition.bezier_parameter(ratio);
            assert_abs_diff_eq!(transition.bezier().solve_component(t, 0), ratio, epsilon = 1e-9);
        }
    }

    #[test]
    fn split_halves_reproduce_the_curve() {
        let transition = KeyframeTransition::new(DVec2::new(0.4, 0.0), DVec2::new(0.2, 1.0));
        let x = 0.3;
        let mid_factor = transition.lerp_factor(x);
        let (left, right) = transition.split(x);

        for i in 1..10 {
            let r = i as f64 / 10.0;
            let whole = transition.lerp_factor(r * x);
            assert_abs_diff_eq!(left.lerp_factor(r) * mid_factor, whole, epsilon = 1e-6);

            let whole = transition.lerp_factor(x + r * (1.0 - x));
            let part = mid_factor + right.lerp_factor(r) * (1.0 - mid_factor);
            assert_abs_diff_eq!(part, whole, epsilon = 1e-6);
        }
    }
}
