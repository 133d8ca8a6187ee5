//! Numeric helpers and bezier geometry.

pub mod bezier;

use glam::DVec2;

pub const EPSILON: f64 = 1e-9;

pub fn lerp(a: f64, b: f64, factor: f64) -> f64 {
    a + (b - a) * factor
}

/// Inverse of [`lerp`]: where `value` falls between `a` and `b`.
pub fn unlerp(a: f64, b: f64, value: f64) -> f64 {
    if b == a {
        return 0.0;
    }
    (value - a) / (b - a)
}

/// Floating modulo with the sign of the divisor.
pub fn fmod(value: f64, modulo: f64) -> f64 {
    ((value % modulo) + modulo) % modulo
}

pub fn fuzzy_compare(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Vector of `length` at `angle` radians.
pub fn from_polar(length: f64, angle: f64) -> DVec2 {
    DVec2::new(length * angle.cos(), length * angle.sin())
}
