//! Hybrid root-finding algorithm.
//!
//! Combines Newton-Raphson with Brent's method for robust convergence.

use crate::error::{MathError, MathResult};
use crate::solvers::{brent, SolverConfig, SolverResult, NUMERICAL_DERIVATIVE_STEP};

/// Newton iterations allowed before falling back to Brent.
const MAX_NEWTON_ITERATIONS: u32 = 20;

/// Consecutive growing residuals tolerated before Newton is abandoned.
const MAX_DIVERGENCE: u32 = 3;

/// Hybrid root-finding algorithm.
///
/// # Strategy
///
/// 1. Run Newton-Raphson for a limited number of iterations
/// 2. If Newton diverges, meets a zero derivative or leaves the finite
///    range, switch to Brent
/// 3. Brent uses `bounds` when given, otherwise a bracket found by
///    expanding outward from the initial guess
///
/// # Example
///
/// ```rust
/// use yieldline_math::solvers::{hybrid, SolverConfig};
///
/// let f = |x: f64| x * x * x - x - 2.0;
/// let df = |x: f64| 3.0 * x * x - 1.0;
///
/// let result = hybrid(f, df, 1.5, Some((1.0, 2.0)), &SolverConfig::default()).unwrap();
/// assert!((f(result.root)).abs() < 1e-10);
/// ```
pub fn hybrid<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    bounds: Option<(f64, f64)>,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    match newton_with_monitoring(&f, &df, initial_guess, config) {
        Ok(result) => Ok(result),
        Err(newton_error) => {
            tracing::debug!(error = %newton_error, "newton abandoned, falling back to brent");
            let (a, b) = match bounds {
                Some(bracket) => bracket,
                None => find_bracket(&f, initial_guess).ok_or_else(|| {
                    MathError::bad_argument(
                        "newton failed and no sign change was found around the guess",
                    )
                })?,
            };
            brent(&f, a, b, config)
        }
    }
}

/// Newton-Raphson that fails fast on divergence.
fn newton_with_monitoring<F, DF>(
    f: &F,
    df: &DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    let mut x = initial_guess;
    let mut prev_residual = f64::MAX;
    let mut divergence_count = 0;
    let max_iter = config.max_iterations.min(MAX_NEWTON_ITERATIONS);

    for iteration in 0..max_iter {
        let fx = f(x);
        let residual = fx.abs();

        if residual < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual: fx,
            });
        }

        if residual > prev_residual * 2.0 {
            divergence_count += 1;
            if divergence_count >= MAX_DIVERGENCE {
                return Err(MathError::bad_argument("newton iterates are running away"));
            }
        } else {
            divergence_count = 0;
        }
        prev_residual = residual;

        let dfx = df(x);
        if dfx.abs() < 1e-15 || !dfx.is_finite() {
            return Err(MathError::FlatDerivative { derivative: dfx });
        }

        let step = fx / dfx;
        x -= step;

        if !x.is_finite() {
            return Err(MathError::bad_argument("newton step left the finite range"));
        }

        if step.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual: f(x),
            });
        }
    }

    Err(MathError::no_convergence(max_iter, f(x).abs()))
}

/// Searches for an interval around `initial_guess` on which `f` changes sign.
///
/// The interval grows geometrically from a half-width of 0.1. Points where
/// `f` is not finite are skipped.
pub fn find_bracket<F>(f: &F, initial_guess: f64) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    let f_init = f(initial_guess);
    if f_init == 0.0 {
        return Some((initial_guess, initial_guess));
    }

    let mut delta = 0.1;
    for _ in 0..50 {
        let left = initial_guess - delta;
        let right = initial_guess + delta;
        let f_left = f(left);
        let f_right = f(right);

        if f_init.is_finite() {
            if f_left.is_finite() && f_left * f_init < 0.0 {
                return Some((left, initial_guess));
            }
            if f_right.is_finite() && f_right * f_init < 0.0 {
                return Some((initial_guess, right));
            }
        }
        if f_left.is_finite() && f_right.is_finite() && f_left * f_right < 0.0 {
            return Some((left, right));
        }

        delta *= 2.0;
        if delta > 1e6 {
            break;
        }
    }

    None
}

/// Hybrid solver with a central-difference derivative.
pub fn hybrid_numerical<F>(
    f: F,
    initial_guess: f64,
    bounds: Option<(f64, f64)>,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let h = NUMERICAL_DERIVATIVE_STEP;
    let df = |x: f64| (f(x + h) - f(x - h)) / (2.0 * h);

    hybrid(&f, df, initial_guess, bounds, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let f = |x: f64| x * x - 2.0;
        let df = |x: f64| 2.0 * x;

        let result = hybrid(f, df, 1.5, Some((1.0, 2.0)), &SolverConfig::default()).unwrap();

        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_derivative_falls_back() {
        // f'(0) = 0, so Newton cannot start at 0
        let f = |x: f64| x * x - 4.0;
        let df = |x: f64| 2.0 * x;

        let result = hybrid(f, df, 0.0, Some((0.0, 5.0)), &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fallback_finds_bracket() {
        let f = |x: f64| x * x - 4.0;
        let df = |x: f64| 2.0 * x;

        let result = hybrid(f, df, 0.0, None, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root.abs(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_root_anywhere() {
        let f = |x: f64| x * x + 1.0;
        let df = |x: f64| 2.0 * x;

        assert!(hybrid(f, df, 0.0, None, &SolverConfig::default()).is_err());
    }

    #[test]
    fn test_find_bracket() {
        let f = |x: f64| x - 3.0;
        let (a, b) = find_bracket(&f, 0.0).unwrap();
        assert!(f(a) * f(b) <= 0.0);
    }
}
