//! The yield curve contract.
//!
//! Every curve answers three primitive questions: the rate at a time in its
//! own convention, the discount factor at a time and the rate implied by a
//! discount factor. Everything else (dated lookups, conversions, forwards
//! and curve comparison) is derived from those.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCount, DayCountConvention, Date, YieldConvention};

use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;

/// Maturities used by [`YieldCurve::compare_to`] when none are given.
pub const DEFAULT_COMPARISON_MATURITIES: [f64; 6] = [0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

/// Spreads applied when reading a forward rate off a curve.
///
/// `start` and `end` shift the discount factors at the two ends of the
/// period; `forward` is taken off the implied forward rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardSpreads {
    /// Spread on the discount factor at the start of the period.
    pub start: f64,
    /// Spread on the discount factor at the end of the period.
    pub end: f64,
    /// Spread removed from the implied forward rate.
    pub forward: f64,
}

impl ForwardSpreads {
    /// No spreads: the curve's own forward.
    pub const NONE: Self = Self {
        start: 0.0,
        end: 0.0,
        forward: 0.0,
    };

    /// Explicit spreads.
    #[must_use]
    pub fn new(start: f64, end: f64, forward: f64) -> Self {
        Self {
            start,
            end,
            forward,
        }
    }

    /// Forward of the curve moved in parallel by `shift`.
    #[must_use]
    pub fn shifted(shift: f64) -> Self {
        Self::new(shift, shift, 0.0)
    }
}

/// One row of a curve comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveComparisonRow {
    /// Maturity in years.
    pub maturity: f64,
    /// Rate of this curve in its own convention.
    pub rate: f64,
    /// Rate implied by the other curve's discount factor, in this curve's convention.
    pub other_rate: f64,
    /// `rate - other_rate`.
    pub spread: f64,
}

/// A term structure of interest rates anchored at a curve date.
///
/// Times are year fractions measured from [`curve_date`](YieldCurve::curve_date)
/// with the curve's own day count. A `spread` argument shifts the curve's
/// rate in its own convention before discounting.
///
/// # Example
///
/// ```rust
/// use yieldline_core::{Date, YieldConvention};
/// use yieldline_curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::aer(0.05, Date::from_ymd(2025, 1, 1).unwrap());
/// let df = curve.discount_t(2.0, 0.0).unwrap();
/// assert!((df - 1.0 / 1.05_f64.powi(2)).abs() < 1e-12);
///
/// let bey = curve.get_rate(2.0, YieldConvention::Bey, 0.0).unwrap();
/// assert!(bey < 0.05);
/// ```
pub trait YieldCurve: fmt::Debug {
    /// Date from which times are measured.
    fn curve_date(&self) -> Date;

    /// Day count used to turn dates into times.
    fn day_count(&self) -> DayCountConvention;

    /// Convention the curve's rates are quoted in.
    fn yield_convention(&self) -> YieldConvention;

    /// Rate at time `t` in the curve's own convention, shifted by `spread`.
    fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64>;

    /// Discount factor at time `t` with the rate shifted by `spread`.
    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64>;

    /// Rate in the curve's convention implied by discount factor `df` over `t` years,
    /// net of `spread`.
    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64>;

    /// Serializable description of the curve.
    fn snapshot(&self) -> CurveSnapshot;

    /// Year fraction from the curve date to `date`.
    fn time_to(&self, date: Date) -> CurveResult<f64> {
        Ok(self.day_count().fraction(self.curve_date(), date, None)?)
    }

    /// Discount factor at `date`.
    fn discount_date(&self, date: Date, spread: f64) -> CurveResult<f64> {
        self.discount_t(self.time_to(date)?, spread)
    }

    /// Rate at time `t` expressed in `convention`.
    fn get_rate(&self, t: f64, convention: YieldConvention, spread: f64) -> CurveResult<f64> {
        let rate = self.rate_t(t, spread)?;
        Ok(convert_yield(rate, self.yield_convention(), convention)?)
    }

    /// Rate at `date` expressed in `convention`.
    fn date_rate(&self, date: Date, convention: YieldConvention, spread: f64) -> CurveResult<f64> {
        self.get_rate(self.time_to(date)?, convention, spread)
    }

    /// Forward rate between times `t_start` and `t_end`.
    ///
    /// The discount factors at each end are read with their own spread, and
    /// the implied forward is restated as a rate with `spreads.forward`
    /// removed. [`ForwardSpreads::shifted`] gives the forward of a parallel
    /// shifted curve.
    fn forward_t_start_t_end(
        &self,
        t_start: f64,
        t_end: f64,
        convention: YieldConvention,
        spreads: ForwardSpreads,
    ) -> CurveResult<f64> {
        if t_end <= t_start {
            return Err(CurveError::invalid_input(format!(
                "forward end {t_end} must be after start {t_start}"
            )));
        }
        let df = self.discount_t(t_end, spreads.end)? / self.discount_t(t_start, spreads.start)?;
        let forward = self.discount_to_rate(df, t_end - t_start, spreads.forward)?;
        Ok(convert_yield(forward, self.yield_convention(), convention)?)
    }

    /// Forward rate starting at `t_start` for `dt` years.
    fn forward_t_start_dt(
        &self,
        t_start: f64,
        dt: f64,
        convention: YieldConvention,
        spreads: ForwardSpreads,
    ) -> CurveResult<f64> {
        self.forward_t_start_t_end(t_start, t_start + dt, convention, spreads)
    }

    /// Forward rate starting at `start` for `dt` years.
    fn forward_dt(
        &self,
        start: Date,
        dt: f64,
        convention: YieldConvention,
        spreads: ForwardSpreads,
    ) -> CurveResult<f64> {
        self.forward_t_start_dt(self.time_to(start)?, dt, convention, spreads)
    }

    /// Forward rate between two dates.
    fn forward_dates(
        &self,
        start: Date,
        end: Date,
        convention: YieldConvention,
        spreads: ForwardSpreads,
    ) -> CurveResult<f64> {
        let dt = self.day_count().fraction(start, end, None)?;
        self.forward_dt(start, dt, convention, spreads)
    }

    /// Compares this curve with `other` at the given maturities.
    ///
    /// The other curve's discount factors are re-expressed as rates in this
    /// curve's convention, so the spread is like for like.
    fn compare_to(
        &self,
        other: &dyn YieldCurve,
        maturities: Option<&[f64]>,
    ) -> CurveResult<Vec<CurveComparisonRow>> {
        let maturities = maturities.unwrap_or(&DEFAULT_COMPARISON_MATURITIES);
        maturities
            .iter()
            .map(|&maturity| {
                let rate = self.get_rate(maturity, self.yield_convention(), 0.0)?;
                let other_rate =
                    self.discount_to_rate(other.discount_t(maturity, 0.0)?, maturity, 0.0)?;
                Ok(CurveComparisonRow {
                    maturity,
                    rate,
                    other_rate,
                    spread: rate - other_rate,
                })
            })
            .collect()
    }
}

macro_rules! forward_yield_curve {
    ($($wrapper:ty),*) => {
        $(
            impl<C: YieldCurve + ?Sized> YieldCurve for $wrapper {
                fn curve_date(&self) -> Date {
                    (**self).curve_date()
                }

                fn day_count(&self) -> DayCountConvention {
                    (**self).day_count()
                }

                fn yield_convention(&self) -> YieldConvention {
                    (**self).yield_convention()
                }

                fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
                    (**self).rate_t(t, spread)
                }

                fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
                    (**self).discount_t(t, spread)
                }

                fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
                    (**self).discount_to_rate(df, t, spread)
                }

                fn snapshot(&self) -> CurveSnapshot {
                    (**self).snapshot()
                }
            }
        )*
    };
}

forward_yield_curve!(&C, Box<C>, Rc<C>);

/// Discount factor for an annual-compounded rate.
pub(crate) fn annual_discount(annual_rate: f64, t: f64) -> f64 {
    (1.0 + annual_rate).powf(-t)
}

/// Annual-compounded rate implied by a discount factor.
pub(crate) fn annual_rate_from_discount(df: f64, t: f64) -> CurveResult<f64> {
    if t <= 0.0 {
        return Err(CurveError::invalid_input(format!(
            "cannot imply a rate over non-positive time {t}"
        )));
    }
    if df <= 0.0 {
        return Err(CurveError::invalid_input(format!(
            "discount factor must be positive, got {df}"
        )));
    }
    Ok(df.powf(-1.0 / t) - 1.0)
}
