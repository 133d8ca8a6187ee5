use glam::{DVec2, DVec3};
use std::ops::{Add, Mul, Sub};

/// Vector space a bezier can live in.
pub trait BezierVector:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    const DIMENSIONS: usize;

    fn component(&self, index: usize) -> f64;
    fn set_component(&mut self, index: usize, value: f64);
}

impl BezierVector for f64 {
    const DIMENSIONS: usize = 1;

    fn component(&self, _index: usize) -> f64 {
        *self
    }

    fn set_component(&mut self, _index: usize, value: f64) {
        *self = value;
    }
}

impl BezierVector for DVec2 {
    const DIMENSIONS: usize = 2;

    fn component(&self, index: usize) -> f64 {
        self[index]
    }

    fn set_component(&mut self, index: usize, value: f64) {
        self[index] = value;
    }
}

impl BezierVector for DVec3 {
    const DIMENSIONS: usize = 3;

    fn component(&self, index: usize) -> f64 {
        self[index]
    }

    fn set_component(&mut self, index: usize, value: f64) {
        self[index] = value;
    }
}

fn lerp<V: BezierVector>(a: V, b: V, t: f64) -> V {
    a + (b - a) * t
}

/// A single cubic segment.
///
/// The polynomial form `((a*t + b)*t + c)*t + d` is computed once on
/// construction; evaluation is branch free and `t` is not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezierSolver<V> {
    points: [V; 4],
    a: V,
    b: V,
    c: V,
    d: V,
}

impl<V: BezierVector> CubicBezierSolver<V> {
    pub fn new(p0: V, p1: V, p2: V, p3: V) -> Self {
        Self::from_points([p0, p1, p2, p3])
    }

    pub fn from_points(points: [V; 4]) -> Self {
        let [k0, k1, k2, k3] = points;
        Self {
            points,
            a: k3 - k0 + (k1 - k2) * 3.0,
            b: (k0 + k2) * 3.0 - k1 * 6.0,
            c: (k1 - k0) * 3.0,
            d: k0,
        }
    }

    pub fn points(&self) -> &[V; 4] {
        &self.points
    }

    pub fn set_points(&mut self, points: [V; 4]) {
        *self = Self::from_points(points);
    }

    pub fn solve(&self, t: f64) -> V {
        ((self.a * t + self.b) * t + self.c) * t + self.d
    }

    pub fn solve_component(&self, t: f64, component: usize) -> f64 {
        let a = self.a.component(component);
        let b = self.b.component(component);
        let c = self.c.component(component);
        let d = self.d.component(component);
        ((a * t + b) * t + c) * t + d
    }

    /// Derivative of one component with respect to `t`.
    pub fn derivative(&self, t: f64, component: usize) -> f64 {
        let a = self.a.component(component);
        let b = self.b.component(component);
        let c = self.c.component(component);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    /// De Casteljau subdivision; `left[3] == right[0] == solve(t)`.
    pub fn split(&self, t: f64) -> ([V; 4], [V; 4]) {
        let [p0, p1, p2, p3] = self.points;
        let p01 = lerp(p0, p1, t);
        let p12 = lerp(p1, p2, t);
        let p23 = lerp(p2, p3, t);
        let p012 = lerp(p01, p12, t);
        let p123 = lerp(p12, p23, t);
        let mid = lerp(p012, p123, t);
        ([p0, p01, p012, mid], [mid, p123, p23, p3])
    }

    /// Exact axis-aligned bounds as `(min, max)`.
    ///
    /// Each axis is handled on its own: the roots of the derivative inside
    /// [0, 1] plus both end points are the only extremum candidates.
    pub fn bounds(&self) -> (V, V) {
        let mut min = V::default();
        let mut max = V::default();

        for component in 0..V::DIMENSIONS {
            let mut candidates = vec![0.0, 1.0];
            self.extrema(component, &mut candidates);

            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for t in candidates {
                let value = self.solve_component(t, component);
                lo = lo.min(value);
                hi = hi.max(value);
            }
            min.set_component(component, lo);
            max.set_component(component, hi);
        }

        (min, max)
    }

    fn extrema(&self, component: usize, out: &mut Vec<f64>) {
        // Derivative as a quadratic: qa t^2 + qb t + qc
        let qa = 3.0 * self.a.component(component);
        let qb = 2.0 * self.b.component(component);
        let qc = self.c.component(component);

        let mut push = |t: f64| {
            if t > 0.0 && t < 1.0 {
                out.push(t);
            }
        };

        if qa.abs() < 1e-12 {
            // Linear derivative; a constant one contributes no extremum
            if qb.abs() >= 1e-12 {
                push(-qc / qb);
            }
            return;
        }

        let discriminant = qb * qb - 4.0 * qa * qc;
        if discriminant < 0.0 {
            return;
        }
        if discriminant == 0.0 {
            push(-qb / (2.0 * qa));
            return;
        }
        let root = discriminant.sqrt();
        push((-qb + root) / (2.0 * qa));
        push((-qb - root) / (2.0 * qa));
    }
}

impl CubicBezierSolver<DVec2> {
    pub fn tangent_angle(&self, t: f64) -> f64 {
        self.derivative(t, 1).atan2(self.derivative(t, 0))
    }

    pub fn bounding_rect(&self) -> kurbo::Rect {
        let (min, max) = self.bounds();
        kurbo::Rect::new(min.x, min.y, max.x, max.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> CubicBezierSolver<DVec2> {
        CubicBezierSolver::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 3.0),
            DVec2::new(2.0, -3.0),
            DVec2::new(3.0, 0.0),
        )
    }

    #[test]
    fn solve_hits_end_points() {
        let bez = sample();
        assert_eq!(bez.solve(0.0), DVec2::new(0.0, 0.0));
        let end = bez.solve(1.0);
        assert_abs_diff_eq!(end.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(end.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn split_reparametrizes_both_halves() {
        let bez = CubicBezierSolver::new(
            DVec2::new(-2.0, 1.0),
            DVec2::new(5.0, 7.0),
            DVec2::new(3.0, -4.0),
            DVec2::new(8.0, 2.0),
        );
        for &t in &[0.1, 0.37, 0.5, 0.82] {
            let (left, right) = bez.split(t);
            let pivot = bez.solve(t);
            assert_abs_diff_eq!(left[3].x, pivot.x, epsilon = 1e-9);
            assert_abs_diff_eq!(left[3].y, pivot.y, epsilon = 1e-9);
            assert_eq!(left[3], right[0]);

            let left = CubicBezierSolver::from_points(left);
            let right = CubicBezierSolver::from_points(right);
            for i in 0..=10 {
                let local = i as f64 / 10.0;
                let a = left.solve(local);
                let expected = bez.solve(t * local);
                assert_abs_diff_eq!(a.x, expected.x, epsilon = 1e-9);
                assert_abs_diff_eq!(a.y, expected.y, epsilon = 1e-9);

                let b = right.solve(local);
                let expected = bez.solve(t + (1.0 - t) * local);
                assert_abs_diff_eq!(b.x, expected.x, epsilon = 1e-9);
                assert_abs_diff_eq!(b.y, expected.y, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn bounds_include_interior_extrema() {
        let bez = sample();
        let (min, max) = bez.bounds();

        assert!(min.y < 0.0 && max.y > 0.0);
        assert_abs_diff_eq!(min.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(max.x, 3.0, epsilon = 1e-12);

        for i in 0..200 {
            let p = bez.solve(i as f64 / 199.0);
            assert!(p.x >= min.x - 1e-9 && p.x <= max.x + 1e-9);
            assert!(p.y >= min.y - 1e-9 && p.y <= max.y + 1e-9);
        }
        // Symmetric curve: extrema at t = 0.5 -+ sqrt(3)/6
        assert_abs_diff_eq!(max.y, 3.0_f64.sqrt() / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(min.y, -max.y, epsilon = 1e-9);
    }

    #[test]
    fn constant_segment_bounds_are_its_point() {
        let p = DVec2::new(4.0, -1.0);
        let bez = CubicBezierSolver::new(p, p, p, p);
        assert_eq!(bez.bounds(), (p, p));
    }

    #[test]
    fn linear_derivative_case() {
        // Quadratic-shaped y: the cubic coefficient vanishes
        let bez = CubicBezierSolver::new(0.0, 1.0, 1.0, 0.0);
        let (min, max) = bez.bounds();
        assert_abs_diff_eq!(min, 0.0);
        assert_abs_diff_eq!(max, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn tangent_angle_of_straight_line() {
        let bez = CubicBezierSolver::new(
            DVec2::ZERO,
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(3.0, 3.0),
        );
        assert_abs_diff_eq!(bez.tangent_angle(0.4), std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
    }
}
