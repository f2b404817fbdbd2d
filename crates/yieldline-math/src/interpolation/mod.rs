//! Interpolation used for zero curves and initial guesses.
//!
//! Zero-rate curves interpolate linearly between nodes and hold the end
//! values flat outside them. Initial guesses for curve fitting extend the
//! end segments linearly instead.

mod linear;

pub use linear::{Extrapolation, LinearInterpolator};

use crate::error::MathResult;

/// Trait for interpolation methods.
pub trait Interpolator: Send + Sync {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the interpolation range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}
