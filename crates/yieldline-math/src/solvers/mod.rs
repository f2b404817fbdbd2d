//! Root-finding algorithms.
//!
//! - [`newton_raphson`]: quadratic convergence when a derivative is available
//! - [`newton_raphson_numerical`]: Newton with a central-difference derivative
//! - [`brent`]: bracketing method, guaranteed once a sign change is known
//! - [`hybrid`]: Newton with divergence monitoring and a Brent fallback
//!
//! Yield solving uses [`SolverConfig::ytm`]; everything else defaults to
//! [`SolverConfig::default`].
//!
//! # Example: YTM Calculation
//!
//! ```rust
//! use yieldline_math::solvers::{hybrid, SolverConfig};
//!
//! // Bond: 5% annual coupon, 5 years, price 95
//! let price_fn = |y: f64| {
//!     let mut pv = 0.0;
//!     for t in 1..=5 {
//!         pv += 5.0 / (1.0 + y).powi(t);
//!     }
//!     pv += 100.0 / (1.0 + y).powi(5);
//!     pv - 95.0
//! };
//!
//! let d_price_fn = |y: f64| {
//!     let mut dpv = 0.0;
//!     for t in 1..=5 {
//!         dpv -= (t as f64) * 5.0 / (1.0 + y).powi(t + 1);
//!     }
//!     dpv -= 5.0 * 100.0 / (1.0 + y).powi(6);
//!     dpv
//! };
//!
//! let result = hybrid(price_fn, d_price_fn, 0.05, Some((0.0, 0.20)), &SolverConfig::default()).unwrap();
//! assert!(result.root > 0.05);
//! ```

mod brent;
mod hybrid;
mod newton;

pub use brent::brent;
pub use hybrid::{find_bracket, hybrid, hybrid_numerical};
pub use newton::{newton_raphson, newton_raphson_numerical, NUMERICAL_DERIVATIVE_STEP};

/// Default tolerance for root-finding algorithms.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for root-finding algorithms.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Tolerance for convergence, applied to both the residual and the step.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Settings used when solving a yield to maturity from a price.
    #[must_use]
    pub fn ytm() -> Self {
        Self::new(1e-6, 100)
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a root-finding iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Final residual (function value at root).
    pub residual: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solver_config() {
        let config = SolverConfig::default()
            .with_tolerance(1e-8)
            .with_max_iterations(50);

        assert!((config.tolerance - 1e-8).abs() < f64::EPSILON);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(SolverConfig::ytm(), SolverConfig::new(1e-6, 100));
    }

    /// Semi-annual bond price per 100 face.
    fn bond_price(yield_rate: f64, coupon: f64, years: i32) -> f64 {
        let periods = years * 2;
        let r = yield_rate / 2.0;
        let mut pv = 0.0;
        for t in 1..=periods {
            pv += coupon / 2.0 / (1.0 + r).powi(t);
        }
        pv + 100.0 / (1.0 + r).powi(periods)
    }

    #[test]
    fn test_par_bond_yield_equals_coupon() {
        let f = |y: f64| bond_price(y, 5.0, 10) - 100.0;
        let result = newton_raphson_numerical(f, 0.04, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_all_solvers_agree() {
        let f = |y: f64| bond_price(y, 6.0, 7) - 98.0;
        let config = SolverConfig::default();

        let newton = newton_raphson_numerical(f, 0.06, &config).unwrap();
        let brent_result = brent(f, 0.0, 0.20, &config).unwrap();
        let hybrid_result = hybrid_numerical(f, 0.06, None, &config).unwrap();

        assert_relative_eq!(newton.root, brent_result.root, epsilon = 1e-8);
        assert_relative_eq!(newton.root, hybrid_result.root, epsilon = 1e-8);
    }
}
