//! Credit spread curves.
//!
//! A credit spread curve holds the extra yield an issuer pays over a
//! benchmark curve, quoted in a compounding convention of its own. On its
//! own it does not discount anything; pair it with a benchmark through
//! [`CombinedCurve`](crate::CombinedCurve).

use std::fmt;
use std::rc::Rc;

use tracing::debug;
use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCount, DayCountConvention, Date, YieldConvention};
use yieldline_math::interpolation::{Interpolator, LinearInterpolator};

use crate::bootstrap::{
    check_instrument, solve_step, two_flow_annual_rate, BootstrapInstrument, SolvedPoints,
};
use crate::curve::YieldCurve;
use crate::error::{CurveError, CurveResult};
use crate::snapshot::SpreadSnapshot;

/// Spread over a benchmark as a function of maturity.
pub trait CreditSpread: fmt::Debug {
    /// Date from which times are measured.
    fn curve_date(&self) -> Date;

    /// Convention in which the spread is added to a rate.
    fn yield_convention(&self) -> YieldConvention;

    /// Spread at time `t`.
    fn spread(&self, t: f64) -> CurveResult<f64>;

    /// Spread at `date`.
    fn date_spread(&self, date: Date) -> CurveResult<f64>;

    /// Serializable description of the curve.
    fn snapshot(&self) -> SpreadSnapshot;
}

macro_rules! forward_credit_spread {
    ($($wrapper:ty),*) => {
        $(
            impl<C: CreditSpread + ?Sized> CreditSpread for $wrapper {
                fn curve_date(&self) -> Date {
                    (**self).curve_date()
                }

                fn yield_convention(&self) -> YieldConvention {
                    (**self).yield_convention()
                }

                fn spread(&self, t: f64) -> CurveResult<f64> {
                    (**self).spread(t)
                }

                fn date_spread(&self, date: Date) -> CurveResult<f64> {
                    (**self).date_spread(date)
                }

                fn snapshot(&self) -> SpreadSnapshot {
                    (**self).snapshot()
                }
            }
        )*
    };
}

forward_credit_spread!(&C, Box<C>, Rc<C>);

/// The same spread at every maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCreditSpreadCurve {
    curve_date: Date,
    spread: f64,
    yield_convention: YieldConvention,
}

impl FlatCreditSpreadCurve {
    /// Creates a flat spread added in Annual compounding.
    #[must_use]
    pub fn new(spread: f64, curve_date: Date) -> Self {
        Self {
            curve_date,
            spread,
            yield_convention: YieldConvention::Annual,
        }
    }

    /// Sets the convention the spread is added in.
    #[must_use]
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.yield_convention = yield_convention;
        self
    }

    /// Same spread anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self { curve_date, ..*self }
    }
}

impl CreditSpread for FlatCreditSpreadCurve {
    fn curve_date(&self) -> Date {
        self.curve_date
    }

    fn yield_convention(&self) -> YieldConvention {
        self.yield_convention
    }

    fn spread(&self, _t: f64) -> CurveResult<f64> {
        Ok(self.spread)
    }

    fn date_spread(&self, _date: Date) -> CurveResult<f64> {
        Ok(self.spread)
    }

    fn snapshot(&self) -> SpreadSnapshot {
        SpreadSnapshot::Flat {
            curve_date: self.curve_date,
            spread: self.spread,
            yield_convention: self.yield_convention,
        }
    }
}

/// Spreads at node maturities, linear in between and flat outside.
///
/// Built either from known spreads or bootstrapped from bonds priced
/// against a benchmark curve.
///
/// # Example
///
/// ```rust
/// use yieldline_core::Date;
/// use yieldline_curves::{CreditSpread, CreditSpreadCurve};
///
/// let curve = CreditSpreadCurve::from_spreads(
///     Date::from_ymd(2025, 1, 1).unwrap(),
///     vec![(1.0, 0.01), (3.0, 0.02)],
/// )
/// .unwrap();
/// assert!((curve.spread(2.0).unwrap() - 0.015).abs() < 1e-12);
/// assert_eq!(curve.spread(10.0).unwrap(), 0.02);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreditSpreadCurve {
    curve_date: Date,
    spreads: LinearInterpolator,
    day_count: DayCountConvention,
    yield_convention: YieldConvention,
}

impl CreditSpreadCurve {
    /// Creates a curve from `(maturity in years, spread)` nodes on actual/365,
    /// Annual.
    pub fn from_spreads(curve_date: Date, spreads: Vec<(f64, f64)>) -> CurveResult<Self> {
        if let Some(&(t, _)) = spreads.iter().find(|(t, _)| *t < 0.0) {
            return Err(CurveError::NegativeTime { t });
        }
        Ok(Self {
            curve_date,
            spreads: LinearInterpolator::from_points(&spreads)?,
            day_count: DayCountConvention::Act365,
            yield_convention: YieldConvention::Annual,
        })
    }

    /// Bootstraps spreads over `benchmark` using the benchmark's curve
    /// date, day count and convention.
    pub fn spread_from_bonds<I: BootstrapInstrument>(
        benchmark: &dyn YieldCurve,
        instruments: &[I],
    ) -> Result<Self, I::Error> {
        Self::bootstrap(
            benchmark.curve_date(),
            benchmark,
            instruments,
            benchmark.day_count(),
            benchmark.yield_convention(),
        )
    }

    /// Bootstraps spreads over `benchmark` from priced instruments.
    ///
    /// Every instrument must settle on `curve_date`. A spread `s` at a
    /// payment date means the flow is discounted at the benchmark rate
    /// raised by `s` in `yield_convention`.
    pub fn bootstrap<I: BootstrapInstrument>(
        curve_date: Date,
        benchmark: &dyn YieldCurve,
        instruments: &[I],
        day_count: DayCountConvention,
        yield_convention: YieldConvention,
    ) -> Result<Self, I::Error> {
        if instruments.is_empty() {
            return Err(CurveError::invalid_input("no instruments to bootstrap from").into());
        }
        let mut ordered: Vec<&I> = instruments.iter().collect();
        ordered.sort_by_key(|instrument| instrument.maturity());

        let mut solved = SolvedPoints::new();
        for instrument in ordered {
            let price = check_instrument(instrument, curve_date)?;
            let maturity_date = instrument.maturity();
            let maturity = day_count
                .fraction(curve_date, maturity_date, None)
                .map_err(CurveError::from)?;
            let benchmark_rate = benchmark.date_rate(maturity_date, yield_convention, 0.0)?;

            let timed = instrument.time_to_payments()?;

            let spread = if timed.len() == 2 {
                let annual = two_flow_annual_rate(&timed, price)?;
                convert_yield(annual, YieldConvention::Annual, yield_convention)
                    .map_err(CurveError::from)?
                    - benchmark_rate
            } else {
                let dated = instrument.dated_flows()?;
                let flows = dated
                    .iter()
                    .map(|&(date, cf)| Ok((day_count.fraction(curve_date, date, None)?, cf)))
                    .collect::<CurveResult<Vec<_>>>()?;
                let guess = instrument.yield_guess()?;

                let discount = |i: usize, trial: Option<f64>| -> CurveResult<f64> {
                    let (date, _) = dated[i];
                    let t = flows[i].0;
                    if t <= 0.0 {
                        return Ok(1.0);
                    }
                    let spread = solved.value_at(t, trial.map(|s| (maturity, s)))?;
                    let base = benchmark.date_rate(date, benchmark.yield_convention(), 0.0)?;
                    let in_convention = benchmark.date_rate(date, yield_convention, 0.0)?;
                    let shifted = convert_yield(
                        in_convention + spread,
                        yield_convention,
                        benchmark.yield_convention(),
                    )?;
                    benchmark.discount_date(date, shifted - base)
                };
                solve_step(
                    maturity,
                    &flows,
                    solved.last_maturity(),
                    guess,
                    benchmark_rate,
                    discount,
                )?
            };

            debug!(maturity, spread, "bootstrapped credit spread");
            solved.push(maturity, spread)?;
        }

        let spreads = LinearInterpolator::from_points(solved.points()).map_err(CurveError::from)?;
        Ok(Self {
            curve_date,
            spreads,
            day_count,
            yield_convention,
        })
    }

    /// Sets the day count used for dated lookups.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the convention the spreads are added in.
    #[must_use]
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.yield_convention = yield_convention;
        self
    }

    /// Same curve anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self {
            curve_date,
            ..self.clone()
        }
    }

    /// Day count used for dated lookups.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// `(maturity, spread)` nodes in maturity order.
    #[must_use]
    pub fn spreads(&self) -> Vec<(f64, f64)> {
        self.spreads
            .xs()
            .iter()
            .copied()
            .zip(self.spreads.ys().iter().copied())
            .collect()
    }
}

impl CreditSpread for CreditSpreadCurve {
    fn curve_date(&self) -> Date {
        self.curve_date
    }

    fn yield_convention(&self) -> YieldConvention {
        self.yield_convention
    }

    fn spread(&self, t: f64) -> CurveResult<f64> {
        if t < 0.0 {
            return Err(CurveError::NegativeTime { t });
        }
        Ok(self.spreads.interpolate(t)?)
    }

    fn date_spread(&self, date: Date) -> CurveResult<f64> {
        self.spread(self.day_count.fraction(self.curve_date, date, None)?)
    }

    fn snapshot(&self) -> SpreadSnapshot {
        SpreadSnapshot::Term {
            curve_date: self.curve_date,
            spreads: self.spreads(),
            day_count: self.day_count,
            yield_convention: self.yield_convention,
        }
    }
}
