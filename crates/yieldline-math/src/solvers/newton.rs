//! Newton-Raphson root-finding algorithm.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Step used for central-difference derivatives.
pub const NUMERICAL_DERIVATIVE_STEP: f64 = 1e-8;

/// Derivatives smaller than this are treated as zero.
const MIN_DERIVATIVE: f64 = 1e-15;

/// Newton-Raphson root-finding algorithm.
///
/// Uses the iteration `x_{n+1} = x_n - f(x_n) / f'(x_n)` and stops when
/// either `|f(x)|` or the step falls below the tolerance.
///
/// # Errors
///
/// - `MathError::FlatDerivative` when the derivative vanishes
/// - `MathError::NoConvergence` when the iteration cap is reached or
///   the iterate stops being finite
///
/// # Example
///
/// ```rust
/// use yieldline_math::solvers::{newton_raphson, SolverConfig};
///
/// let f = |x: f64| x * x - 2.0;
/// let df = |x: f64| 2.0 * x;
///
/// let result = newton_raphson(f, df, 1.5, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn newton_raphson<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    let mut x = initial_guess;

    for iteration in 0..config.max_iterations {
        let fx = f(x);
        tracing::trace!(iteration, x, residual = fx, "newton step");

        if fx.abs() < config.tolerance {
            tracing::debug!(iterations = iteration, root = x, "newton converged");
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual: fx,
            });
        }

        let dfx = df(x);
        if dfx.abs() < MIN_DERIVATIVE || !dfx.is_finite() {
            return Err(MathError::FlatDerivative { derivative: dfx });
        }

        let step = fx / dfx;
        x -= step;

        if !x.is_finite() {
            break;
        }

        if step.abs() < config.tolerance {
            tracing::debug!(iterations = iteration + 1, root = x, "newton converged on step");
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual: f(x),
            });
        }
    }

    let residual = f(x).abs();
    tracing::warn!(
        max_iterations = config.max_iterations,
        residual,
        "newton failed to converge"
    );
    Err(MathError::no_convergence(config.max_iterations, residual))
}

/// Newton-Raphson with a central-difference derivative.
pub fn newton_raphson_numerical<F>(
    f: F,
    initial_guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let h = NUMERICAL_DERIVATIVE_STEP;
    let df = |x: f64| (f(x + h) - f(x - h)) / (2.0 * h);

    newton_raphson(&f, df, initial_guess, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let f = |x: f64| x * x - 2.0;
        let df = |x: f64| 2.0 * x;

        let result = newton_raphson(f, df, 1.5, &SolverConfig::default()).unwrap();

        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
        assert!(result.iterations < 10);
    }

    #[test]
    fn test_numerical_derivative() {
        let f = |x: f64| x * x * x - 27.0;

        let result = newton_raphson_numerical(f, 2.0, &SolverConfig::default()).unwrap();

        assert_relative_eq!(result.root, 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_zero_derivative() {
        let f = |x: f64| x * x + 1.0;
        let df = |x: f64| 2.0 * x;

        let result = newton_raphson(f, df, 0.0, &SolverConfig::default());
        assert!(matches!(result, Err(MathError::FlatDerivative { .. })));
    }

    #[test]
    fn test_iteration_cap() {
        // No real root: iterates forever without converging
        let f = |x: f64| x * x + 1.0;
        let df = |x: f64| 2.0 * x;

        let config = SolverConfig::default().with_max_iterations(5);
        let result = newton_raphson(f, df, 0.5, &config);
        assert!(matches!(
            result,
            Err(MathError::NoConvergence { iterations: 5, .. })
        ));
    }

    #[test]
    fn test_zero_coupon_yield() {
        // 100 / (1 + y)^5 = 62.0921 at roughly 10%
        let f = |y: f64| 100.0 / (1.0 + y).powi(5) - 62.0921;
        let df = |y: f64| -5.0 * 100.0 / (1.0 + y).powi(6);

        let result = newton_raphson(f, df, 0.08, &SolverConfig::ytm()).unwrap();
        assert_relative_eq!(result.root, 0.10, epsilon = 1e-4);
    }
}
