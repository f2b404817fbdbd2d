//! Price and yield calculations on timed cash flows.
//!
//! - [`price_from_yield_times`]: present value of `(t, cf)` pairs at a yield
//! - [`yield_from_times`]: yield that prices the flows (price included) to zero
//! - [`solve_curve_spread`]: spread over a curve that reprices a set of flows
//!
//! Periodic conventions compound `k` times a year (`k` being the time
//! adjustment): times are scaled by `k`, the per-period rate is solved and
//! then annualized again. Continuous yields are solved as Annual and
//! converted.

use std::cell::RefCell;

use tracing::debug;
use yieldline_core::rates::convert_yield;
use yieldline_core::YieldConvention;
use yieldline_math::irr::xirr;
use yieldline_math::solvers::{hybrid_numerical, newton_raphson_numerical, SolverConfig};
use yieldline_math::MathError;

use crate::error::{BondError, BondResult};

/// Present value of timed flows at `ytm`.
///
/// `Σ cf / (1 + y/k)^(t·k)` for periodic conventions and `Σ cf·e^(−y·t)`
/// for Continuous.
///
/// # Example
///
/// ```rust
/// use yieldline_bonds::pricing::price_from_yield_times;
/// use yieldline_core::YieldConvention;
///
/// let flows = [(1.0, 5.0), (2.0, 105.0)];
/// let price = price_from_yield_times(&flows, 0.05, YieldConvention::Annual);
/// assert!((price - 100.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn price_from_yield_times(times: &[(f64, f64)], ytm: f64, convention: YieldConvention) -> f64 {
    if convention == YieldConvention::Continuous {
        return times.iter().map(|&(t, cf)| cf * (-ytm * t).exp()).sum();
    }
    let k = convention.time_adjustment();
    times
        .iter()
        .map(|&(t, cf)| cf / (1.0 + ytm / k).powf(t * k))
        .sum()
}

/// Yield in `convention` at which the flows, price included, sum to zero.
///
/// `period_guess` is the starting per-period rate.
///
/// # Errors
///
/// Fails if fewer than two flows are given or the solver does not converge.
pub fn yield_from_times(
    times: &[(f64, f64)],
    period_guess: f64,
    convention: YieldConvention,
    config: &SolverConfig,
) -> BondResult<f64> {
    let k = convention.time_adjustment();
    let scaled: Vec<(f64, f64)> = times.iter().map(|&(t, cf)| (t * k, cf)).collect();
    let rate = xirr(&scaled, period_guess, config)? * k;
    if convention == YieldConvention::Continuous {
        return Ok(convert_yield(rate, YieldConvention::Annual, YieldConvention::Continuous)?);
    }
    Ok(rate)
}

/// Per-period starting guess for a coupon rate given in percent.
#[must_use]
pub fn coupon_yield_guess(cpn: f64, convention: YieldConvention) -> f64 {
    if cpn > 0.0 {
        cpn / 100.0 / convention.time_adjustment()
    } else {
        0.05
    }
}

/// Root of a fallible curve objective, starting from `guess`.
///
/// Uses Newton with a numerical derivative and falls back to the bracketed
/// hybrid solver when the derivative vanishes. The first error raised by
/// the objective is returned in preference to any solver error.
pub fn solve_curve_spread<F>(guess: f64, objective: F) -> BondResult<f64>
where
    F: Fn(f64) -> BondResult<f64>,
{
    let failure: RefCell<Option<BondError>> = RefCell::new(None);
    let f = |x: f64| match objective(x) {
        Ok(value) => value,
        Err(err) => {
            failure.borrow_mut().get_or_insert(err);
            f64::NAN
        }
    };

    let config = SolverConfig::default();
    let result = match newton_raphson_numerical(&f, guess, &config) {
        Err(MathError::FlatDerivative { .. }) => {
            debug!(guess, "flat objective, retrying spread solve with hybrid solver");
            hybrid_numerical(&f, guess, None, &config)
        }
        other => other,
    };

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    Ok(result?.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_price_conventions() {
        let flows = [(0.5, 2.5), (1.0, 102.5)];
        let bey = price_from_yield_times(&flows, 0.05, YieldConvention::Bey);
        assert_relative_eq!(bey, 100.0, epsilon = 1e-12);

        let continuous = price_from_yield_times(&flows, 0.05, YieldConvention::Continuous);
        let expected = 2.5 * (-0.025_f64).exp() + 102.5 * (-0.05_f64).exp();
        assert_relative_eq!(continuous, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_yield_inverts_price() {
        let flows = [(0.0, -95.0), (1.0, 5.0), (2.0, 5.0), (3.0, 105.0)];
        for convention in [
            YieldConvention::Annual,
            YieldConvention::Bey,
            YieldConvention::BeyM,
            YieldConvention::Continuous,
        ] {
            let ytm = yield_from_times(&flows, 0.05, convention, &SolverConfig::ytm()).unwrap();
            let price = price_from_yield_times(&flows[1..], ytm, convention);
            assert_relative_eq!(price, 95.0, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_yield_needs_two_flows() {
        let result = yield_from_times(&[(1.0, 100.0)], 0.05, YieldConvention::Annual, &SolverConfig::ytm());
        assert!(matches!(result, Err(BondError::Math(_))));
    }

    #[test]
    fn test_coupon_guess() {
        assert_relative_eq!(coupon_yield_guess(6.0, YieldConvention::Bey), 0.03);
        assert_relative_eq!(coupon_yield_guess(0.0, YieldConvention::Bey), 0.05);
    }

    #[test]
    fn test_curve_spread_solve() {
        let z = solve_curve_spread(0.0, |s| Ok(105.0 / (1.03 + s) - 100.0)).unwrap();
        assert_relative_eq!(z, 0.02, epsilon = 1e-9);
    }

    #[test]
    fn test_curve_spread_propagates_objective_error() {
        let result = solve_curve_spread(0.0, |_| Err(BondError::UnresolvedValuation));
        assert_eq!(result, Err(BondError::UnresolvedValuation));
    }
}
