//! Flat yield curves.

use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCountConvention, Date, YieldConvention};

use crate::curve::{annual_discount, annual_rate_from_discount, YieldCurve};
use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;

/// A curve with the same rate at every maturity.
///
/// The three standard flavours differ only in how the rate compounds and in
/// the day count used for dated lookups:
///
/// | constructor         | convention | day count  | discount factor        |
/// |---------------------|------------|------------|------------------------|
/// | [`FlatCurve::log`]  | Continuous | actual/365 | `e^{-(r+s)t}`          |
/// | [`FlatCurve::aer`]  | Annual     | actual/365 | `(1+r+s)^{-t}`         |
/// | [`FlatCurve::bey`]  | BEY        | 30/360     | `(1+(r+s)/2)^{-2t}`    |
///
/// # Example
///
/// ```rust
/// use yieldline_core::Date;
/// use yieldline_curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::bey(0.05, Date::from_ymd(2025, 1, 1).unwrap());
/// assert!((curve.discount_t(1.0, 0.0).unwrap() - 0.975_609_756).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCurve {
    curve_date: Date,
    rate: f64,
    day_count: DayCountConvention,
    yield_convention: YieldConvention,
}

impl FlatCurve {
    /// Creates a flat curve in an arbitrary compounding convention.
    ///
    /// # Errors
    ///
    /// Money-market conventions have no term structure and are rejected.
    pub fn new(
        rate: f64,
        curve_date: Date,
        day_count: DayCountConvention,
        yield_convention: YieldConvention,
    ) -> CurveResult<Self> {
        if yield_convention.is_money_market() {
            return Err(CurveError::invalid_input(format!(
                "{yield_convention} cannot be used for a flat curve"
            )));
        }
        Ok(Self {
            curve_date,
            rate,
            day_count,
            yield_convention,
        })
    }

    /// Continuously compounded flat curve on actual/365.
    #[must_use]
    pub fn log(rate: f64, curve_date: Date) -> Self {
        Self {
            curve_date,
            rate,
            day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::Continuous,
        }
    }

    /// Annual effective rate flat curve on actual/365.
    #[must_use]
    pub fn aer(rate: f64, curve_date: Date) -> Self {
        Self {
            curve_date,
            rate,
            day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::Annual,
        }
    }

    /// Bond-equivalent yield flat curve on 30/360.
    #[must_use]
    pub fn bey(rate: f64, curve_date: Date) -> Self {
        Self {
            curve_date,
            rate,
            day_count: DayCountConvention::Thirty360,
            yield_convention: YieldConvention::Bey,
        }
    }

    /// The flat rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Same curve anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self { curve_date, ..*self }
    }
}

impl YieldCurve for FlatCurve {
    fn curve_date(&self) -> Date {
        self.curve_date
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn yield_convention(&self) -> YieldConvention {
        self.yield_convention
    }

    fn rate_t(&self, _t: f64, spread: f64) -> CurveResult<f64> {
        Ok(self.rate + spread)
    }

    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        let shifted = self.rate + spread;
        Ok(match self.yield_convention {
            YieldConvention::Continuous => (-shifted * t).exp(),
            convention => {
                annual_discount(convert_yield(shifted, convention, YieldConvention::Annual)?, t)
            }
        })
    }

    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
        let annual = annual_rate_from_discount(df, t)?;
        Ok(match self.yield_convention {
            YieldConvention::Continuous => -df.ln() / t,
            convention => convert_yield(annual, YieldConvention::Annual, convention)?,
        } - spread)
    }

    fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot::Flat {
            curve_date: self.curve_date,
            rate: self.rate,
            day_count: self.day_count,
            yield_convention: self.yield_convention,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn curve_date() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_flat_bey_discount() {
        let curve = FlatCurve::bey(0.05, curve_date());
        assert_relative_eq!(
            curve.discount_t(1.0, 0.0).unwrap(),
            1.025_f64.powi(-2),
            epsilon = 1e-12
        );
        assert_relative_eq!(curve.discount_t(1.0, 0.0).unwrap(), 0.97561, epsilon = 1e-5);
        assert_eq!(curve.day_count(), DayCountConvention::Thirty360);
    }

    #[test]
    fn test_flat_log_discount_and_inverse() {
        let curve = FlatCurve::log(0.03, curve_date());
        let df = curve.discount_t(2.0, 0.01).unwrap();
        assert_relative_eq!(df, (-0.08_f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(curve.discount_to_rate(df, 2.0, 0.01).unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_aer_discount_and_inverse() {
        let curve = FlatCurve::aer(0.04, curve_date());
        let df = curve.discount_t(3.0, 0.0).unwrap();
        assert_relative_eq!(df, 1.04_f64.powi(-3), epsilon = 1e-12);
        assert_relative_eq!(curve.discount_to_rate(df, 3.0, 0.0).unwrap(), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_date_rate_conversion() {
        let curve = FlatCurve::bey(0.05, curve_date());
        let date = Date::from_ymd(2030, 1, 1).unwrap();
        let annual = curve.date_rate(date, YieldConvention::Annual, 0.0).unwrap();
        assert_relative_eq!(annual, 1.025_f64.powi(2) - 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            curve.date_rate(date, YieldConvention::Bey, 0.001).unwrap(),
            0.051,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_discount_date_uses_day_count() {
        let curve = FlatCurve::bey(0.05, curve_date());
        // 30/360: six months is exactly half a year
        let date = Date::from_ymd(2025, 7, 1).unwrap();
        assert_relative_eq!(
            curve.discount_date(date, 0.0).unwrap(),
            1.0 / 1.025,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_money_market_convention_rejected() {
        assert!(FlatCurve::new(
            0.05,
            curve_date(),
            DayCountConvention::Act360,
            YieldConvention::Discount
        )
        .is_err());
    }

    #[test]
    fn test_with_curve_date_and_snapshot() {
        let curve = FlatCurve::aer(0.04, curve_date());
        let moved = curve.with_curve_date(Date::from_ymd(2026, 1, 1).unwrap());
        assert_eq!(moved.rate(), 0.04);
        assert_eq!(moved.curve_date(), Date::from_ymd(2026, 1, 1).unwrap());
        assert!(matches!(moved.snapshot(), CurveSnapshot::Flat { rate, .. } if rate == 0.04));
    }

    proptest! {
        #[test]
        fn prop_discount_factors_decrease(rate in 0.0001f64..0.2, t in 0.1f64..30.0) {
            for curve in [
                FlatCurve::log(rate, curve_date()),
                FlatCurve::aer(rate, curve_date()),
                FlatCurve::bey(rate, curve_date()),
            ] {
                let near = curve.discount_t(t, 0.0).unwrap();
                let far = curve.discount_t(t + 0.5, 0.0).unwrap();
                prop_assert!(far < near);
                prop_assert!(near < 1.0);
            }
        }
    }
}
