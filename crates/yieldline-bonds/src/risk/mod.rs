//! Duration, convexity and DV01.
//!
//! Analytic measures are PV-weighted sums divided by the price. Effective
//! measures reprice at bumped yields; bump sizes live in [`BumpSizes`].
//! Durations, DV01 and spreads are reported rounded to 10 decimal places.

use serde::{Deserialize, Serialize};
use yieldline_core::rounding::round_to;
use yieldline_core::YieldConvention;

use crate::error::BondResult;

/// Decimal places of reported sensitivities.
pub const REPORTED_DECIMALS: u32 = 10;

/// Bump sizes of the effective measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BumpSizes {
    /// Yield bump for effective duration.
    pub duration: f64,
    /// Yield bump for effective convexity.
    pub convexity: f64,
    /// Yield bump for DV01 (one basis point).
    pub dv01: f64,
    /// Discount margin bump in bps for effective spread duration.
    pub spread_duration_bps: f64,
    /// Discount margin bump in bps for spread DV01.
    pub spread_dv01_bps: f64,
}

impl Default for BumpSizes {
    fn default() -> Self {
        Self {
            duration: 1e-7,
            convexity: 1e-3,
            dv01: 1e-4,
            spread_duration_bps: 1e-4,
            spread_dv01_bps: 1.0,
        }
    }
}

impl BumpSizes {
    /// Sets the duration bump.
    #[must_use]
    pub fn with_duration(mut self, bump: f64) -> Self {
        self.duration = bump;
        self
    }

    /// Sets the convexity bump.
    #[must_use]
    pub fn with_convexity(mut self, bump: f64) -> Self {
        self.convexity = bump;
        self
    }
}

/// PV-weighted sums behind the analytic measures, not yet divided by price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensitivitySums {
    /// Numerator of modified duration.
    pub modified: f64,
    /// Numerator of Macaulay duration.
    pub macaulay: f64,
    /// Numerator of convexity.
    pub convexity: f64,
}

impl SensitivitySums {
    /// Sums for timed flows at `ytm`.
    ///
    /// With `k` the time adjustment:
    /// modified `Σ t·cf/(1+y/k)^(tk+1)`, Macaulay `Σ t·cf/(1+y/k)^(tk)` and
    /// convexity `Σ cf·tk(tk+1)/(1+y/k)^(tk+2)/k²`. Continuous yields use
    /// `Σ t·cf·e^(−yt)` and `Σ t²·cf·e^(−yt)`.
    #[must_use]
    pub fn from_times(times: &[(f64, f64)], ytm: f64, convention: YieldConvention) -> Self {
        if convention == YieldConvention::Continuous {
            return times.iter().fold(Self::default(), |acc, &(t, cf)| {
                let pv = cf * (-ytm * t).exp();
                Self {
                    modified: acc.modified + t * pv,
                    macaulay: acc.macaulay + t * pv,
                    convexity: acc.convexity + t * t * pv,
                }
            });
        }

        let k = convention.time_adjustment();
        let base = 1.0 + ytm / k;
        times.iter().fold(Self::default(), |acc, &(t, cf)| {
            let tk = t * k;
            Self {
                modified: acc.modified + t * cf / base.powf(tk + 1.0),
                macaulay: acc.macaulay + t * cf / base.powf(tk),
                convexity: acc.convexity + cf * tk * (tk + 1.0) / base.powf(tk + 2.0) / (k * k),
            }
        })
    }

    /// Reported measures at `price`.
    #[must_use]
    pub fn per_price(&self, price: f64) -> AnalyticRisk {
        AnalyticRisk {
            modified_duration: per_price(self.modified, price),
            macaulay_duration: per_price(self.macaulay, price),
            convexity: per_price(self.convexity, price),
        }
    }
}

/// Analytic duration and convexity of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticRisk {
    /// Modified duration.
    pub modified_duration: f64,
    /// Macaulay duration in years.
    pub macaulay_duration: f64,
    /// Convexity.
    pub convexity: f64,
}

/// `sum / price` rounded for reporting; zero at a zero price.
#[must_use]
pub fn per_price(sum: f64, price: f64) -> f64 {
    if price == 0.0 {
        return 0.0;
    }
    round_to(sum / price, REPORTED_DECIMALS)
}

/// `−(P₊ − P₋) / (2ε·P)`, rounded.
pub fn effective_duration<F>(price_at: F, ytm: f64, price: f64, bump: f64) -> BondResult<f64>
where
    F: Fn(f64) -> BondResult<f64>,
{
    if price == 0.0 {
        return Ok(0.0);
    }
    let up = price_at(ytm + bump)?;
    let down = price_at(ytm - bump)?;
    Ok(round_to(-(up - down) / (2.0 * bump * price), REPORTED_DECIMALS))
}

/// `(P₊ + P₋ − 2P) / (ε²·P)`.
pub fn effective_convexity<F>(price_at: F, ytm: f64, price: f64, bump: f64) -> BondResult<f64>
where
    F: Fn(f64) -> BondResult<f64>,
{
    if price == 0.0 {
        return Ok(0.0);
    }
    let up = price_at(ytm + bump)?;
    let down = price_at(ytm - bump)?;
    Ok((up + down - 2.0 * price) / (bump * bump * price))
}

/// `(P(y+ε) − P(y−ε)) / 2`, rounded. Negative for a long position.
pub fn dv01<F>(price_at: F, ytm: f64, bump: f64) -> BondResult<f64>
where
    F: Fn(f64) -> BondResult<f64>,
{
    let up = price_at(ytm + bump)?;
    let down = price_at(ytm - bump)?;
    Ok(round_to((up - down) / 2.0, REPORTED_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price_from_yield_times;
    use approx::assert_relative_eq;

    fn flows() -> Vec<(f64, f64)> {
        vec![(1.0, 5.0), (2.0, 5.0), (3.0, 105.0)]
    }

    #[test]
    fn test_par_bond_durations() {
        let sums = SensitivitySums::from_times(&flows(), 0.05, YieldConvention::Annual);
        let risk = sums.per_price(100.0);
        assert_relative_eq!(risk.macaulay_duration, 2.8594104308, epsilon = 1e-9);
        assert_relative_eq!(
            risk.modified_duration,
            risk.macaulay_duration / 1.05,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_effective_matches_analytic() {
        let price_at = |y: f64| Ok(price_from_yield_times(&flows(), y, YieldConvention::Bey));
        let ytm = 0.04;
        let price = price_at(ytm).unwrap();

        let analytic = SensitivitySums::from_times(&flows(), ytm, YieldConvention::Bey).per_price(price);
        let effective = effective_duration(price_at, ytm, price, 1e-7).unwrap();
        assert_relative_eq!(effective, analytic.modified_duration, epsilon = 1e-6);

        let convexity = effective_convexity(price_at, ytm, price, 1e-3).unwrap();
        assert_relative_eq!(convexity, analytic.convexity, max_relative = 1e-4);
    }

    #[test]
    fn test_continuous_sums() {
        let sums = SensitivitySums::from_times(&[(2.0, 100.0)], 0.03, YieldConvention::Continuous);
        let pv = 100.0 * (-0.06_f64).exp();
        assert_relative_eq!(sums.modified, 2.0 * pv, epsilon = 1e-12);
        assert_relative_eq!(sums.convexity, 4.0 * pv, epsilon = 1e-12);
    }

    #[test]
    fn test_dv01_sign() {
        let price_at = |y: f64| Ok(price_from_yield_times(&flows(), y, YieldConvention::Annual));
        let value = dv01(price_at, 0.05, 1e-4).unwrap();
        assert!(value < 0.0);
        assert!(value.abs() < 0.1);
    }

    #[test]
    fn test_zero_price() {
        assert_eq!(per_price(1.0, 0.0), 0.0);
    }
}
