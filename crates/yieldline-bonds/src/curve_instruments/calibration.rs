//! Quoted bonds as curve calibration instruments.

use yieldline_core::{Date, YieldConvention};
use yieldline_curves::{
    BootstrapInstrument, CreditSpreadCurve, InterpolatedCurve, SpotCurve, YieldCurve,
};
use yieldline_math::optimization::FitterConfig;

use crate::error::{BondError, BondResult};
use crate::traits::YieldInstrument;
use crate::types::ValuationRequest;

/// A bond viewed at its stored settlement date and price.
///
/// Curve builders read the quote the bond carries, so the bond must be
/// settled on the curve date and priced (directly or through its yield).
#[derive(Debug)]
pub struct CalibrationBond<'a, B> {
    bond: &'a B,
}

impl<'a, B> CalibrationBond<'a, B> {
    /// Wraps a quoted bond.
    pub fn new(bond: &'a B) -> Self {
        Self { bond }
    }

    /// The wrapped bond.
    pub fn bond(&self) -> &'a B {
        self.bond
    }
}

impl<B> Clone for CalibrationBond<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for CalibrationBond<'_, B> {}

impl<B> CalibrationBond<'_, B>
where
    B: YieldInstrument<Timing = Vec<(f64, f64)>>,
{
    fn quoted_request(&self) -> ValuationRequest {
        ValuationRequest {
            settlement: self.bond.settlement_date(),
            price: self.bond.price(),
            ..ValuationRequest::default()
        }
    }
}

impl<B> BootstrapInstrument for CalibrationBond<'_, B>
where
    B: YieldInstrument<Timing = Vec<(f64, f64)>>,
{
    type Error = BondError;

    fn maturity(&self) -> Date {
        self.bond.maturity()
    }

    fn settlement_date(&self) -> Option<Date> {
        self.bond.settlement_date()
    }

    fn price(&self) -> Option<f64> {
        self.bond.price()
    }

    fn time_to_payments(&self) -> BondResult<Vec<(f64, f64)>> {
        self.bond.time_to_payments(&self.quoted_request())
    }

    fn dated_flows(&self) -> BondResult<Vec<(Date, f64)>> {
        Ok(self
            .bond
            .filter_payment_flow(&self.quoted_request())?
            .into_iter()
            .collect())
    }

    fn yield_guess(&self) -> BondResult<f64> {
        self.bond.yield_to_maturity(&ValuationRequest::new())
    }

    fn duration_guess(&self) -> BondResult<f64> {
        self.bond.effective_duration(&ValuationRequest::new())
    }
}

fn calibration_set<B>(bonds: &[B]) -> Vec<CalibrationBond<'_, B>> {
    bonds.iter().map(CalibrationBond::new).collect()
}

/// Bootstraps a zero curve in `yield_convention` from quoted bonds
/// settled on `curve_date`.
///
/// # Example
///
/// ```rust
/// use yieldline_bonds::curve_instruments::bootstrap_spot_curve;
/// use yieldline_bonds::prelude::*;
/// use yieldline_core::{Date, YieldConvention};
///
/// let date = Date::from_ymd(2025, 1, 2).unwrap();
/// let bond = FixedRateBullet::builder()
///     .issue_date(date)
///     .maturity(Date::from_ymd(2026, 1, 2).unwrap())
///     .coupon_percent(0.0)
///     .frequency(0)
///     .yield_convention(YieldConvention::Annual)
///     .settlement_date(date)
///     .yield_to_maturity(0.04)
///     .build()
///     .unwrap();
///
/// let curve = bootstrap_spot_curve(date, &[bond], YieldConvention::Annual).unwrap();
/// assert!((curve.zero_rate(1.0).unwrap() - 0.04).abs() < 1e-10);
/// ```
pub fn bootstrap_spot_curve<B>(
    curve_date: Date,
    bonds: &[B],
    yield_convention: YieldConvention,
) -> BondResult<SpotCurve>
where
    B: YieldInstrument<Timing = Vec<(f64, f64)>>,
{
    SpotCurve::bootstrap_with(curve_date, &calibration_set(bonds), yield_convention)
}

/// Fits an interpolated zero curve to quoted bonds.
pub fn fit_interpolated_curve<B>(
    curve_date: Date,
    bonds: &[B],
    nodes: Option<&[f64]>,
    config: &FitterConfig,
) -> BondResult<InterpolatedCurve>
where
    B: YieldInstrument<Timing = Vec<(f64, f64)>>,
{
    InterpolatedCurve::fit(curve_date, &calibration_set(bonds), nodes, config)
}

/// Bootstraps credit spreads of quoted bonds over `benchmark`.
pub fn credit_spread_curve<B>(
    benchmark: &dyn YieldCurve,
    bonds: &[B],
) -> BondResult<CreditSpreadCurve>
where
    B: YieldInstrument<Timing = Vec<(f64, f64)>>,
{
    CreditSpreadCurve::spread_from_bonds(benchmark, &calibration_set(bonds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::FixedRateBullet;
    use crate::traits::FixedIncome;
    use approx::assert_relative_eq;
    use yieldline_curves::{CreditSpread, FlatCurve};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn annual_bond(years: i32, cpn: f64, ytm: f64) -> FixedRateBullet {
        let date = d(2025, 1, 2);
        FixedRateBullet::builder()
            .issue_date(date)
            .maturity(d(2025 + years, 1, 2))
            .coupon_percent(cpn)
            .frequency(u32::from(cpn > 0.0))
            .yield_convention(YieldConvention::Annual)
            .settlement_date(date)
            .yield_to_maturity(ytm)
            .build()
            .unwrap()
    }

    #[test]
    fn test_adaptor_reads_stored_quote() {
        let bond = annual_bond(2, 5.0, 0.05);
        let wrapped = CalibrationBond::new(&bond);
        assert_eq!(wrapped.settlement_date(), Some(d(2025, 1, 2)));
        assert_relative_eq!(wrapped.price().unwrap(), bond.price().unwrap(), epsilon = 1e-12);

        let flows = BootstrapInstrument::time_to_payments(&wrapped).unwrap();
        assert_eq!(flows.len(), 3);
        assert_eq!(flows[0].0, 0.0);
        assert!(flows[0].1 < 0.0);

        let dated = wrapped.dated_flows().unwrap();
        assert_eq!(dated.first().map(|f| f.0), Some(d(2025, 1, 2)));
        assert_relative_eq!(wrapped.yield_guess().unwrap(), 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_yields_bootstrap_flat() {
        let bonds = vec![
            annual_bond(1, 0.0, 0.04),
            annual_bond(2, 4.0, 0.04),
            annual_bond(3, 4.0, 0.04),
        ];
        let curve = bootstrap_spot_curve(d(2025, 1, 2), &bonds, YieldConvention::Annual).unwrap();
        for (t, rate) in curve.zero_rates() {
            assert!(t > 0.0);
            assert_relative_eq!(rate, 0.04, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_unsettled_bond_is_rejected() {
        let bond = FixedRateBullet::builder()
            .issue_date(d(2025, 1, 2))
            .maturity(d(2027, 1, 2))
            .coupon_percent(4.0)
            .frequency(1)
            .build()
            .unwrap();
        let result = bootstrap_spot_curve(d(2025, 1, 2), &[bond], YieldConvention::Annual);
        assert!(matches!(result, Err(BondError::Curve(_))));
    }

    #[test]
    fn test_credit_spread_over_flat_benchmark() {
        let benchmark = FlatCurve::aer(0.03, d(2025, 1, 2));
        let bonds = vec![annual_bond(1, 0.0, 0.04)];
        let spreads = credit_spread_curve(&benchmark, &bonds).unwrap();
        assert_relative_eq!(spreads.spread(1.0).unwrap(), 0.01, epsilon = 1e-6);
    }
}
