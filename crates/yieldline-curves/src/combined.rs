//! A benchmark curve shifted by a credit spread curve.

use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCountConvention, Date, YieldConvention};

use crate::credit::CreditSpread;
use crate::curve::{annual_discount, annual_rate_from_discount, YieldCurve};
use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;

/// Benchmark rates plus credit spreads.
///
/// At each maturity the benchmark rate is converted into the spread
/// curve's convention, the spread is added there, and the total is reported
/// in the combined curve's convention (Annual unless set otherwise).
/// Discounting compounds the Annual equivalent.
///
/// Either input may be borrowed or owned.
///
/// # Example
///
/// ```rust
/// use yieldline_core::{Date, YieldConvention};
/// use yieldline_curves::{CombinedCurve, FlatCreditSpreadCurve, FlatCurve, YieldCurve};
///
/// let date = Date::from_ymd(2025, 1, 1).unwrap();
/// let benchmark = FlatCurve::aer(0.04, date);
/// let spread = FlatCreditSpreadCurve::new(0.03, date);
/// let curve = CombinedCurve::new(&benchmark, &spread).unwrap();
///
/// let rate = curve.get_rate(5.0, YieldConvention::Annual, 0.0).unwrap();
/// assert!((rate - 0.07).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CombinedCurve<B, S> {
    benchmark: B,
    spread_curve: S,
    day_count: DayCountConvention,
    yield_convention: YieldConvention,
}

impl<B: YieldCurve, S: CreditSpread> CombinedCurve<B, S> {
    /// Combines a benchmark with a spread curve.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::CurveDateMismatch` unless both curves share a
    /// curve date.
    pub fn new(benchmark: B, spread_curve: S) -> CurveResult<Self> {
        if benchmark.curve_date() != spread_curve.curve_date() {
            return Err(CurveError::CurveDateMismatch {
                benchmark: benchmark.curve_date(),
                spread: spread_curve.curve_date(),
            });
        }
        Ok(Self {
            benchmark,
            spread_curve,
            day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::Annual,
        })
    }

    /// Sets the day count used for dated lookups.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the convention combined rates are reported in.
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> CurveResult<Self> {
        if yield_convention.is_money_market() {
            return Err(CurveError::invalid_input(format!(
                "{yield_convention} cannot be used for a combined curve"
            )));
        }
        self.yield_convention = yield_convention;
        Ok(self)
    }

    /// The benchmark curve.
    pub fn benchmark(&self) -> &B {
        &self.benchmark
    }

    /// The spread curve.
    pub fn spread_curve(&self) -> &S {
        &self.spread_curve
    }
}

impl<B: YieldCurve, S: CreditSpread> YieldCurve for CombinedCurve<B, S> {
    fn curve_date(&self) -> Date {
        self.benchmark.curve_date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    fn yield_convention(&self) -> YieldConvention {
        self.yield_convention
    }

    fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        let spread_convention = self.spread_curve.yield_convention();
        let base = self.benchmark.rate_t(t, spread)?;
        let base = convert_yield(base, self.benchmark.yield_convention(), spread_convention)?;
        let total = base + self.spread_curve.spread(t)?;
        Ok(convert_yield(total, spread_convention, self.yield_convention)?)
    }

    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        let annual = self.get_rate(t, YieldConvention::Annual, spread)?;
        Ok(annual_discount(annual, t))
    }

    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
        let annual = annual_rate_from_discount(df, t)?;
        Ok(convert_yield(annual, YieldConvention::Annual, self.yield_convention)? - spread)
    }

    fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot::Combined {
            benchmark: Box::new(self.benchmark.snapshot()),
            spread: self.spread_curve.snapshot(),
            day_count: self.day_count,
            yield_convention: self.yield_convention,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::{CreditSpreadCurve, FlatCreditSpreadCurve};
    use crate::flat::FlatCurve;
    use crate::zero_coupon::ZeroCouponCurve;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn curve_date() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_flat_plus_flat() {
        let benchmark = FlatCurve::aer(0.04, curve_date());
        let spread = FlatCreditSpreadCurve::new(0.03, curve_date());
        let curve = CombinedCurve::new(&benchmark, &spread).unwrap();

        assert_relative_eq!(
            curve.get_rate(2.0, YieldConvention::Annual, 0.0).unwrap(),
            0.07,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            curve.discount_t(2.0, 0.0).unwrap(),
            1.07_f64.powi(-2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_converts_before_adding() {
        // BEY benchmark, spread added in Annual terms
        let benchmark = FlatCurve::bey(0.04, curve_date());
        let spread = FlatCreditSpreadCurve::new(0.01, curve_date());
        let curve = CombinedCurve::new(&benchmark, &spread).unwrap();

        let expected = 1.02_f64.powi(2) - 1.0 + 0.01;
        assert_relative_eq!(
            curve.get_rate(1.0, YieldConvention::Annual, 0.0).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_term_spreads_over_zero_curve() {
        let benchmark =
            ZeroCouponCurve::new(curve_date(), vec![(1.0, 0.02), (3.0, 0.04)]).unwrap();
        let spreads =
            CreditSpreadCurve::from_spreads(curve_date(), vec![(1.0, 0.01), (3.0, 0.02)]).unwrap();
        let curve = CombinedCurve::new(benchmark, spreads).unwrap();

        assert_relative_eq!(
            curve.get_rate(2.0, YieldConvention::Annual, 0.0).unwrap(),
            0.045,
            epsilon = 1e-12
        );
        let df = curve.discount_t(2.0, 0.0).unwrap();
        assert_relative_eq!(curve.discount_to_rate(df, 2.0, 0.0).unwrap(), 0.045, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_dates_must_match() {
        let benchmark = FlatCurve::aer(0.04, curve_date());
        let spread = FlatCreditSpreadCurve::new(0.03, Date::from_ymd(2025, 1, 2).unwrap());
        assert!(matches!(
            CombinedCurve::new(&benchmark, &spread),
            Err(CurveError::CurveDateMismatch { .. })
        ));
    }

    #[test]
    fn test_shared_inputs_and_snapshot() {
        let benchmark: Rc<dyn YieldCurve> = Rc::new(FlatCurve::log(0.03, curve_date()));
        let spread: Rc<dyn CreditSpread> = Rc::new(FlatCreditSpreadCurve::new(0.01, curve_date()));
        let curve = CombinedCurve::new(Rc::clone(&benchmark), spread)
            .unwrap()
            .with_yield_convention(YieldConvention::Continuous)
            .unwrap();

        let expected = (0.03_f64.exp() + 0.01).ln();
        assert_relative_eq!(curve.rate_t(4.0, 0.0).unwrap(), expected, epsilon = 1e-12);

        let json = serde_json::to_string(&curve.snapshot()).unwrap();
        assert!(json.contains("\"kind\":\"combined\""));
        assert!(json.contains("\"spread\":0.01"));
    }
}
