//! Zero curve bootstrapped from par bond quotes by tenor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use yieldline_core::{DayCountConvention, Date, YieldConvention};
use yieldline_curves::{CurveResult, CurveSnapshot, SpotCurve, YieldCurve};

use crate::curve_instruments::calibration::bootstrap_spot_curve;
use crate::error::BondResult;
use crate::instruments::FixedRateBullet;

/// Time from the curve date to a quoted bond's maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tenor {
    /// A number of calendar months.
    Months(u32),
    /// A number of years.
    Years(u32),
}

impl Tenor {
    /// Length in months.
    #[must_use]
    pub fn months(&self) -> u32 {
        match self {
            Tenor::Months(months) => *months,
            Tenor::Years(years) => years * 12,
        }
    }

    /// Maturity of a bond issued on `start`.
    pub fn maturity_from(&self, start: Date) -> BondResult<Date> {
        Ok(start.add_months(self.months() as i32)?)
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenor::Months(months) => write!(f, "{months}M"),
            Tenor::Years(years) => write!(f, "{years}Y"),
        }
    }
}

/// Market quote of a par bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quote {
    /// Dirty price.
    Price(f64),
    /// Yield to maturity in the bond yield convention.
    Yield(f64),
}

/// Coupon terms and quote of one tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParQuote {
    /// Annual coupon in percent.
    pub cpn: f64,
    /// Coupons per year, zero for a zero-coupon bond.
    pub cpn_freq: u32,
    /// Price or yield.
    pub quote: Quote,
}

impl ParQuote {
    /// A zero-coupon bond quoted at a yield.
    #[must_use]
    pub fn zero_yield(ytm: f64) -> Self {
        Self {
            cpn: 0.0,
            cpn_freq: 0,
            quote: Quote::Yield(ytm),
        }
    }

    /// A coupon bond quoted at par (price 100).
    #[must_use]
    pub fn at_par(cpn: f64, cpn_freq: u32) -> Self {
        Self {
            cpn,
            cpn_freq,
            quote: Quote::Price(100.0),
        }
    }
}

/// Zero curve bootstrapped from bonds issued and settled on the curve
/// date, one per tenor.
///
/// Bond yields are read in the bond yield convention (BEY by default);
/// curve rates are stored in the curve convention (Annual by default).
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use yieldline_bonds::curve_instruments::{ParCurve, ParQuote, Tenor};
/// use yieldline_core::{Date, YieldConvention};
///
/// let date = Date::from_ymd(2025, 1, 2).unwrap();
/// let quotes = BTreeMap::from([(Tenor::Years(1), ParQuote::zero_yield(0.0395))]);
/// let curve = ParCurve::with_conventions(
///     date,
///     quotes,
///     YieldConvention::Annual,
///     YieldConvention::Annual,
/// )
/// .unwrap();
/// assert!((curve.zero_rate(1.0).unwrap() - 0.0395).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct ParCurve {
    quotes: BTreeMap<Tenor, ParQuote>,
    bond_yield_convention: YieldConvention,
    bonds: Vec<FixedRateBullet>,
    curve: SpotCurve,
}

impl ParCurve {
    /// Bootstraps with BEY bond yields and an Annual curve.
    pub fn new(curve_date: Date, quotes: BTreeMap<Tenor, ParQuote>) -> BondResult<Self> {
        Self::with_conventions(
            curve_date,
            quotes,
            YieldConvention::Bey,
            YieldConvention::Annual,
        )
    }

    /// Bootstraps with explicit bond and curve yield conventions.
    pub fn with_conventions(
        curve_date: Date,
        quotes: BTreeMap<Tenor, ParQuote>,
        bond_yield_convention: YieldConvention,
        curve_yield_convention: YieldConvention,
    ) -> BondResult<Self> {
        let bonds = quotes
            .iter()
            .map(|(tenor, quote)| -> BondResult<FixedRateBullet> {
                let builder = FixedRateBullet::builder()
                    .issue_date(curve_date)
                    .maturity(tenor.maturity_from(curve_date)?)
                    .coupon_percent(quote.cpn)
                    .frequency(quote.cpn_freq)
                    .yield_convention(bond_yield_convention)
                    .settlement_date(curve_date);
                let builder = match quote.quote {
                    Quote::Price(price) => builder.price(price),
                    Quote::Yield(ytm) => builder.yield_to_maturity(ytm),
                };
                builder.build()
            })
            .collect::<BondResult<Vec<_>>>()?;

        let curve = bootstrap_spot_curve(curve_date, &bonds, curve_yield_convention)?;
        debug!(%curve_date, tenors = quotes.len(), "bootstrapped par curve");
        Ok(Self {
            quotes,
            bond_yield_convention,
            bonds,
            curve,
        })
    }

    /// Quotes the curve was built from.
    #[must_use]
    pub fn quotes(&self) -> &BTreeMap<Tenor, ParQuote> {
        &self.quotes
    }

    /// Calibration bonds, in tenor order.
    #[must_use]
    pub fn bonds(&self) -> &[FixedRateBullet] {
        &self.bonds
    }

    /// Convention bond yields are quoted in.
    #[must_use]
    pub fn bond_yield_convention(&self) -> YieldConvention {
        self.bond_yield_convention
    }

    /// Zero rate at `t` in the curve convention.
    pub fn zero_rate(&self, t: f64) -> CurveResult<f64> {
        self.curve.zero_rate(t)
    }

    /// Solved `(t, rate)` points.
    #[must_use]
    pub fn zero_rates(&self) -> Vec<(f64, f64)> {
        self.curve.zero_rates()
    }

    /// The underlying bootstrapped curve.
    #[must_use]
    pub fn spot_curve(&self) -> &SpotCurve {
        &self.curve
    }

    /// Same zero rates, moved to another curve date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self {
            curve: self.curve.with_curve_date(curve_date),
            ..self.clone()
        }
    }
}

impl YieldCurve for ParCurve {
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
    use crate::traits::FixedIncome;
    use approx::assert_relative_eq;

    fn date() -> Date {
        Date::from_ymd(2025, 1, 2).unwrap()
    }

    #[test]
    fn test_tenor() {
        assert_eq!(Tenor::Years(2).months(), 24);
        assert_eq!(Tenor::Months(6).to_string(), "6M");
        assert_eq!(
            Tenor::Months(6).maturity_from(date()).unwrap(),
            Date::from_ymd(2025, 7, 2).unwrap()
        );
    }

    #[test]
    fn test_single_zero_under_bey() {
        let quotes = BTreeMap::from([(Tenor::Years(1), ParQuote::zero_yield(0.0395))]);
        let curve = ParCurve::new(date(), quotes).unwrap();
        let expected = (1.0 + 0.0395 / 2.0_f64).powi(2) - 1.0;
        assert_relative_eq!(curve.zero_rate(1.0).unwrap(), expected, epsilon = 1e-10);
        assert_relative_eq!(curve.zero_rate(1.0).unwrap(), 0.0395, epsilon = 5e-4);
    }

    #[test]
    fn test_par_bonds_reprice() {
        let quotes = BTreeMap::from([
            (Tenor::Years(1), ParQuote::at_par(3.0, 1)),
            (Tenor::Years(2), ParQuote::at_par(3.5, 1)),
            (Tenor::Years(3), ParQuote::at_par(4.0, 1)),
        ]);
        let curve = ParCurve::with_conventions(
            date(),
            quotes,
            YieldConvention::Annual,
            YieldConvention::Annual,
        )
        .unwrap();

        assert_relative_eq!(curve.zero_rate(1.0).unwrap(), 0.03, epsilon = 1e-9);
        let moved = curve.with_curve_date(Date::from_ymd(2026, 1, 2).unwrap());
        assert_eq!(moved.curve_date(), Date::from_ymd(2026, 1, 2).unwrap());
        assert_relative_eq!(moved.zero_rate(1.0).unwrap(), 0.03, epsilon = 1e-9);
        let rates = curve.zero_rates();
        assert_eq!(rates.len(), 3);
        assert!(rates.windows(2).all(|w| w[1].1 > w[0].1));

        for bond in curve.bonds() {
            let pv: f64 = bond
                .cash_flows(Some(date()))
                .unwrap()
                .iter()
                .map(|cf| cf.amount * curve.discount_date(cf.date, 0.0).unwrap())
                .sum();
            assert_relative_eq!(pv, 100.0, epsilon = 1e-6);
        }
    }
}
