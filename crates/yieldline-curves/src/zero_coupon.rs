//! Zero-coupon curves.

use std::collections::BTreeMap;

use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCount, DayCountConvention, Date, YieldConvention};
use yieldline_math::interpolation::{Interpolator, LinearInterpolator};

use crate::curve::{annual_discount, annual_rate_from_discount, YieldCurve};
use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;

/// Zero rates at node maturities.
///
/// Rates between nodes are linearly interpolated and held flat beyond the
/// first and last node. Rates are quoted in the curve's yield convention
/// (Annual unless set otherwise) and times are measured on actual/365
/// unless another day count is chosen.
///
/// # Example
///
/// ```rust
/// use yieldline_core::{Date, YieldConvention};
/// use yieldline_curves::{YieldCurve, ZeroCouponCurve};
///
/// let curve = ZeroCouponCurve::new(
///     Date::from_ymd(2025, 1, 1).unwrap(),
///     vec![(1.0, 0.03), (2.0, 0.04)],
/// )
/// .unwrap();
///
/// let rate = curve.get_rate(1.5, YieldConvention::Annual, 0.0).unwrap();
/// assert!((rate - 0.035).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroCouponCurve {
    curve_date: Date,
    rates: LinearInterpolator,
    day_count: DayCountConvention,
    yield_convention: YieldConvention,
}

impl ZeroCouponCurve {
    /// Creates a curve from `(maturity in years, zero rate)` nodes.
    ///
    /// Nodes may be given in any order.
    ///
    /// # Errors
    ///
    /// Fails on an empty node set, duplicate maturities or negative
    /// maturities.
    pub fn new(curve_date: Date, zero_rates: Vec<(f64, f64)>) -> CurveResult<Self> {
        if let Some(&(t, _)) = zero_rates.iter().find(|(t, _)| *t < 0.0) {
            return Err(CurveError::NegativeTime { t });
        }
        Ok(Self {
            curve_date,
            rates: LinearInterpolator::from_points(&zero_rates)?,
            day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::Annual,
        })
    }

    /// Creates a curve keyed by dates instead of times.
    ///
    /// Each date is turned into a time from the curve date with `day_count`.
    pub fn by_date(
        curve_date: Date,
        zero_rates: &BTreeMap<Date, f64>,
        day_count: DayCountConvention,
    ) -> CurveResult<Self> {
        let nodes = zero_rates
            .iter()
            .map(|(&date, &rate)| Ok((day_count.fraction(curve_date, date, None)?, rate)))
            .collect::<CurveResult<Vec<_>>>()?;
        Ok(Self::new(curve_date, nodes)?.with_day_count(day_count))
    }

    /// Sets the day count used for dated lookups.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the convention the zero rates are quoted in.
    ///
    /// # Errors
    ///
    /// Money-market conventions are rejected.
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> CurveResult<Self> {
        if yield_convention.is_money_market() {
            return Err(CurveError::invalid_input(format!(
                "{yield_convention} cannot be used for a zero-coupon curve"
            )));
        }
        self.yield_convention = yield_convention;
        Ok(self)
    }

    /// Same curve anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self {
            curve_date,
            ..self.clone()
        }
    }

    /// Node maturities in years.
    #[must_use]
    pub fn maturities(&self) -> &[f64] {
        self.rates.xs()
    }

    /// `(maturity, rate)` nodes in maturity order.
    #[must_use]
    pub fn zero_rates(&self) -> Vec<(f64, f64)> {
        self.rates
            .xs()
            .iter()
            .copied()
            .zip(self.rates.ys().iter().copied())
            .collect()
    }

    /// Interpolated zero rate at `t` in the curve's convention.
    pub fn zero_rate(&self, t: f64) -> CurveResult<f64> {
        if t < 0.0 {
            return Err(CurveError::NegativeTime { t });
        }
        Ok(self.rates.interpolate(t)?)
    }
}

impl YieldCurve for ZeroCouponCurve {
    fn curve_date(&self) -> Date {
        self.curve_date
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn yield_convention(&self) -> YieldConvention {
        self.yield_convention
    }

    fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        Ok(self.zero_rate(t)? + spread)
    }

    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        let rate = self.rate_t(t, spread)?;
        let annual = convert_yield(rate, self.yield_convention, YieldConvention::Annual)?;
        Ok(annual_discount(annual, t))
    }

    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
        let annual = annual_rate_from_discount(df, t)?;
        Ok(convert_yield(annual, YieldConvention::Annual, self.yield_convention)? - spread)
    }

    fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot::ZeroCoupon {
            curve_date: self.curve_date,
            zero_rates: self.zero_rates(),
            day_count: self.day_count,
            yield_convention: self.yield_convention,
        }
    }
}
