//! Cubic bezier segments and paths.

mod length;
mod path;
mod solver;

pub use length::{LengthData, LengthPosition};
pub use path::{Bezier, BezierPoint, MultiBezier, PointType};
pub use solver::{BezierVector, CubicBezierSolver};

/// Handle length factor approximating a quarter circle with one cubic.
pub const KAPPA: f64 = 0.552_284_749_830_793_4;
