//! Internal rate of return on timed cash flows.

use crate::error::{MathError, MathResult};
use crate::solvers::{hybrid, newton_raphson, SolverConfig};

/// Present value of `(time, amount)` flows at a per-unit-time rate.
///
/// `Σ cf / (1 + rate)^t`
#[must_use]
pub fn npv(rate: f64, flows: &[(f64, f64)]) -> f64 {
    flows
        .iter()
        .map(|&(t, cf)| cf * (1.0 + rate).powf(-t))
        .sum()
}

/// Derivative of [`npv`] with respect to the rate.
#[must_use]
pub fn npv_derivative(rate: f64, flows: &[(f64, f64)]) -> f64 {
    flows
        .iter()
        .map(|&(t, cf)| -t * cf * (1.0 + rate).powf(-t - 1.0))
        .sum()
}

/// Rate that sets the NPV of timed flows to zero.
///
/// Times are in whatever unit the rate compounds over: years for an
/// annual rate, half-years for a semi-annual rate. Newton-Raphson runs
/// with the analytic derivative; if the derivative vanishes the solve is
/// retried with the bracketed hybrid solver.
///
/// # Errors
///
/// - `MathError::TooFewPoints` with fewer than two flows
/// - `MathError::NoConvergence` if Newton reaches the iteration cap
///
/// # Example
///
/// ```rust
/// use yieldline_math::irr::xirr;
/// use yieldline_math::solvers::SolverConfig;
///
/// let flows = [(0.0, -100.0), (1.0, 5.0), (2.0, 105.0)];
/// let rate = xirr(&flows, 0.1, &SolverConfig::ytm()).unwrap();
/// assert!((rate - 0.05).abs() < 1e-6);
/// ```
pub fn xirr(flows: &[(f64, f64)], guess: f64, config: &SolverConfig) -> MathResult<f64> {
    if flows.len() < 2 {
        return Err(MathError::too_few_points(2, flows.len()));
    }

    let f = |r: f64| npv(r, flows);
    let df = |r: f64| npv_derivative(r, flows);

    match newton_raphson(f, df, guess, config) {
        Ok(result) => Ok(result.root),
        Err(MathError::FlatDerivative { .. }) => {
            tracing::debug!(guess, "vanishing derivative in xirr, retrying with hybrid solver");
            Ok(hybrid(f, df, guess, None, config)?.root)
        }
        Err(e) => Err(e),
    }
}

/// Internal rate of return of evenly spaced flows, one per period.
///
/// The first flow is at period 0. Uses a 10% initial guess.
pub fn irr(flows: &[f64]) -> MathResult<f64> {
    let timed: Vec<(f64, f64)> = flows
        .iter()
        .enumerate()
        .map(|(i, &cf)| (i as f64, cf))
        .collect();
    xirr(&timed, 0.1, &SolverConfig::ytm())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_irr_even_flows() {
        let rate = irr(&[-1000.0, 300.0, 400.0, 500.0]).unwrap();
        let timed = [(0.0, -1000.0), (1.0, 300.0), (2.0, 400.0), (3.0, 500.0)];
        assert_relative_eq!(npv(rate, &timed), 0.0, epsilon = 1e-4);
        assert!(rate > 0.08 && rate < 0.09);
    }

    #[test]
    fn test_xirr_fractional_times() {
        let flows = [(0.0, -95.0), (0.5, 2.5), (1.5, 102.5)];
        let rate = xirr(&flows, 0.05, &SolverConfig::ytm()).unwrap();
        assert!(npv(rate, &flows).abs() < 1e-5);
    }

    #[test]
    fn test_xirr_needs_two_flows() {
        let err = xirr(&[(0.0, -100.0)], 0.1, &SolverConfig::ytm()).unwrap_err();
        assert!(matches!(err, MathError::TooFewPoints { .. }));
    }

    #[test]
    fn test_npv_derivative_matches_finite_difference() {
        let flows = [(0.0, -100.0), (1.0, 6.0), (2.0, 106.0)];
        let h = 1e-6;
        let numeric = (npv(0.05 + h, &flows) - npv(0.05 - h, &flows)) / (2.0 * h);
        assert_relative_eq!(npv_derivative(0.05, &flows), numeric, epsilon = 1e-4);
    }
}
