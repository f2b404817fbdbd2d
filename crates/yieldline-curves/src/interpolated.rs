//! Zero curves on fixed node maturities, optionally fitted to bond prices.

use tracing::{debug, warn};
use yieldline_core::{DayCountConvention, Date, YieldConvention};
use yieldline_math::interpolation::{Extrapolation, Interpolator, LinearInterpolator};
use yieldline_math::optimization::{levenberg_marquardt, FitResult, FitterConfig};

use crate::bootstrap::BootstrapInstrument;
use crate::curve::YieldCurve;
use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;
use crate::zero_coupon::ZeroCouponCurve;

/// Node maturities used when none are given.
pub const DEFAULT_NODES: [f64; 9] = [0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0];

/// Days per year used to place the longest bond on the node grid.
const NODE_YEAR_DAYS: f64 = 365.25;

/// A zero curve whose node rates are either given or fitted.
///
/// Fitting minimizes the squared net present values of the calibration
/// bonds (each priced against the candidate curve, price included) with
/// Levenberg-Marquardt. Bonds with few flows are weighted up so short bonds
/// are not drowned out by long ones.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedCurve {
    curve: ZeroCouponCurve,
    fit: Option<FitResult>,
}

impl InterpolatedCurve {
    /// Creates a curve from known `(maturity, zero rate)` nodes.
    pub fn from_zero_rates(curve_date: Date, zero_rates: Vec<(f64, f64)>) -> CurveResult<Self> {
        Ok(Self {
            curve: ZeroCouponCurve::new(curve_date, zero_rates)?,
            fit: None,
        })
    }

    /// Fits node rates so that every bond reprices to its quoted price.
    ///
    /// Nodes default to [`DEFAULT_NODES`]. The node grid is cut at the first
    /// node at or beyond the longest bond maturity, or extended by its last
    /// step until it reaches it. Initial node rates interpolate each bond's
    /// yield against its effective duration.
    ///
    /// # Errors
    ///
    /// Fails if any bond has no price, if the node grid is not strictly
    /// increasing or if pricing fails during the fit.
    pub fn fit<I: BootstrapInstrument>(
        curve_date: Date,
        instruments: &[I],
        nodes: Option<&[f64]>,
        config: &FitterConfig,
    ) -> Result<Self, I::Error> {
        if instruments.is_empty() {
            return Err(CurveError::invalid_input("no instruments to fit").into());
        }
        for instrument in instruments {
            if instrument.price().is_none() {
                return Err(CurveError::MissingPrice {
                    maturity: instrument.maturity(),
                }
                .into());
            }
        }

        let mut guesses = Vec::with_capacity(instruments.len());
        let mut calibration = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            guesses.push((instrument.duration_guess()?, instrument.yield_guess()?));
            calibration.push(instrument.time_to_payments()?);
        }

        let longest = instruments
            .iter()
            .map(|instrument| instrument.maturity())
            .max()
            .unwrap_or(curve_date);
        let horizon = (longest - curve_date) as f64 / NODE_YEAR_DAYS;
        let nodes = node_grid(nodes.unwrap_or(&DEFAULT_NODES), horizon)?;

        let guess_curve = guess_interpolator(guesses)?;
        let initial = nodes
            .iter()
            .map(|&t| guess_curve.interpolate(t))
            .collect::<Result<Vec<_>, _>>()
            .map_err(CurveError::from)?;

        let fit = levenberg_marquardt(
            |rates: &[f64]| -> CurveResult<Vec<f64>> {
                let nodes_and_rates = nodes.iter().copied().zip(rates.iter().copied()).collect();
                let candidate = ZeroCouponCurve::new(curve_date, nodes_and_rates)?;
                calibration
                    .iter()
                    .map(|flows| weighted_npv(&candidate, flows))
                    .collect()
            },
            &initial,
            config,
        )?;

        if fit.converged {
            debug!(summary = %fit.summary(), nodes = nodes.len(), "fitted interpolated curve");
        } else {
            warn!(summary = %fit.summary(), "interpolated curve fit did not reach tolerance");
        }

        let curve = ZeroCouponCurve::new(
            curve_date,
            nodes.iter().copied().zip(fit.parameters.iter().copied()).collect(),
        )?;
        Ok(Self {
            curve,
            fit: Some(fit),
        })
    }

    /// Sets the day count used for dated lookups.
    #[must_use]
    pub fn with_day_count(self, day_count: DayCountConvention) -> Self {
        Self {
            curve: self.curve.with_day_count(day_count),
            ..self
        }
    }

    /// Same curve anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self {
            curve: self.curve.with_curve_date(curve_date),
            fit: self.fit.clone(),
        }
    }

    /// Node maturities.
    #[must_use]
    pub fn maturities(&self) -> &[f64] {
        self.curve.maturities()
    }

    /// `(maturity, rate)` nodes.
    #[must_use]
    pub fn zero_rates(&self) -> Vec<(f64, f64)> {
        self.curve.zero_rates()
    }

    /// Interpolated zero rate at `t`.
    pub fn zero_rate(&self, t: f64) -> CurveResult<f64> {
        self.curve.zero_rate(t)
    }

    /// Diagnostics of the fit, if the curve was fitted.
    #[must_use]
    pub fn fit_result(&self) -> Option<&FitResult> {
        self.fit.as_ref()
    }
}

/// Net present value of `flows` on `curve`, weighted by flow count.
fn weighted_npv(curve: &ZeroCouponCurve, flows: &[(f64, f64)]) -> CurveResult<f64> {
    let npv = flows.iter().try_fold(0.0, |total, &(t, cf)| {
        Ok::<_, CurveError>(total + cf * curve.discount_t(t, 0.0)?)
    })?;
    let periods = flows.len().saturating_sub(1).max(1) as f64;
    Ok(npv * (60.0 / periods).powf(0.25))
}

/// Cuts or extends `nodes` so that it just covers `horizon` years.
fn node_grid(nodes: &[f64], horizon: f64) -> CurveResult<Vec<f64>> {
    if nodes.is_empty() {
        return Err(CurveError::invalid_input("node grid is empty"));
    }
    if nodes[0] <= 0.0 || nodes.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CurveError::invalid_input(
            "node maturities must be positive and strictly increasing",
        ));
    }

    if let Some(cut) = nodes.iter().position(|&node| node >= horizon) {
        return Ok(nodes[..=cut].to_vec());
    }

    let mut grid = nodes.to_vec();
    let step = match grid.as_slice() {
        [.., prev, last] => last - prev,
        _ => grid[0],
    };
    while grid[grid.len() - 1] < horizon {
        let next = grid[grid.len() - 1] + step;
        grid.push(next);
    }
    Ok(grid)
}

/// Yield-by-duration interpolator with linear ends.
fn guess_interpolator(mut guesses: Vec<(f64, f64)>) -> CurveResult<LinearInterpolator> {
    guesses.sort_by(|a, b| a.0.total_cmp(&b.0));
    guesses.dedup_by(|a, b| a.0 == b.0);
    Ok(LinearInterpolator::from_points(&guesses)?.with_extrapolation(Extrapolation::Linear))
}

impl YieldCurve for InterpolatedCurve {
    fn curve_date(&self) -> Date {
        self.curve.curve_date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.curve.day_count()
    }

    fn yield_convention(&self) -> YieldConvention {
        self.curve.yield_convention()
    }

    fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.rate_t(t, spread)
    }

    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.discount_t(t, spread)
    }

    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.discount_to_rate(df, t, spread)
    }

    fn snapshot(&self) -> CurveSnapshot {
        self.curve.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::test_support::TestBond;
    use approx::assert_relative_eq;

    fn curve_date() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_node_grid_cut() {
        let grid = node_grid(&DEFAULT_NODES, 4.0).unwrap();
        assert_eq!(grid, vec![0.5, 1.0, 2.0, 3.0, 5.0]);

        let grid = node_grid(&DEFAULT_NODES, 5.0).unwrap();
        assert_eq!(grid, vec![0.5, 1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_node_grid_extended() {
        let grid = node_grid(&[1.0, 2.0], 4.5).unwrap();
        assert_eq!(grid, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let grid = node_grid(&[2.0], 5.0).unwrap();
        assert_eq!(grid, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_node_grid_validation() {
        assert!(node_grid(&[], 1.0).is_err());
        assert!(node_grid(&[2.0, 1.0], 1.0).is_err());
        assert!(node_grid(&[0.0, 1.0], 1.0).is_err());
    }

    #[test]
    fn test_from_zero_rates() {
        let curve =
            InterpolatedCurve::from_zero_rates(curve_date(), vec![(1.0, 0.03), (2.0, 0.04)])
                .unwrap();
        assert_relative_eq!(curve.zero_rate(1.5).unwrap(), 0.035, epsilon = 1e-12);
        assert!(curve.fit_result().is_none());
    }

    #[test]
    fn test_fit_reprices_bonds() {
        let truth = ZeroCouponCurve::new(
            curve_date(),
            vec![(1.0, 0.03), (2.0, 0.035), (3.0, 0.04)],
        )
        .unwrap();
        let bonds: Vec<TestBond> = [(1, 3.0), (2, 3.5), (3, 4.0)]
            .iter()
            .map(|&(years, coupon)| TestBond::priced_on(&truth, years, coupon))
            .collect();

        let curve = InterpolatedCurve::fit(
            curve_date(),
            &bonds,
            Some(&[1.0, 2.0, 3.0]),
            &FitterConfig::default(),
        )
        .unwrap();

        let fit = curve.fit_result().unwrap();
        assert!(fit.max_error() < 1e-6, "{}", fit.summary());
        for (t, rate) in truth.zero_rates() {
            assert_relative_eq!(curve.zero_rate(t).unwrap(), rate, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_requires_prices() {
        let truth = ZeroCouponCurve::new(curve_date(), vec![(1.0, 0.03)]).unwrap();
        let mut bond = TestBond::priced_on(&truth, 1, 3.0);
        bond.price = None;
        let result = InterpolatedCurve::fit(curve_date(), &[bond], None, &FitterConfig::default());
        assert!(matches!(result, Err(CurveError::MissingPrice { .. })));
    }
}
