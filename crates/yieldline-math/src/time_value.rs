//! Annuities, perpetuities, interest income and real rates.
//!
//! Rates are per period unless a function says otherwise. Payments are
//! made at the end of each period.

use crate::error::{MathError, MathResult};

/// Present value of `periods` level payments.
///
/// `P · (1 − (1 + r)^−n) / r`, or `P · n` at a zero rate.
///
/// # Example
///
/// ```rust
/// use yieldline_math::time_value::present_value_annuity;
///
/// let pv = present_value_annuity(100.0, 0.05, 10);
/// assert!((pv - 772.173_492_918_5).abs() < 1e-9);
/// ```
#[must_use]
pub fn present_value_annuity(payment: f64, rate: f64, periods: u32) -> f64 {
    if rate == 0.0 {
        return payment * f64::from(periods);
    }
    payment * (1.0 - (1.0 + rate).powf(-f64::from(periods))) / rate
}

/// [`present_value_annuity`] for a nominal annual rate paid
/// `payments_per_year` times a year over `years` years.
#[must_use]
pub fn present_value_annuity_annual(
    payment: f64,
    annual_rate: f64,
    years: u32,
    payments_per_year: u32,
) -> f64 {
    let (rate, periods) = per_period(annual_rate, years, payments_per_year);
    present_value_annuity(payment, rate, periods)
}

/// Present value of payments growing at `growth` per period.
///
/// `payment` is the amount at time zero; the first payment received is
/// `payment · (1 + g)`. Growth equal to the rate gives `payment · n`.
#[must_use]
pub fn present_value_growing_annuity(payment: f64, rate: f64, periods: u32, growth: f64) -> f64 {
    present_value_annuity(payment, (1.0 + rate) / (1.0 + growth) - 1.0, periods)
}

/// Present value of a perpetuity growing at `growth`: `P · (1 + g) / (r − g)`.
///
/// # Errors
///
/// `MathError::BadArgument` unless `rate > growth`.
pub fn present_value_growing_perpetuity(payment: f64, rate: f64, growth: f64) -> MathResult<f64> {
    if rate <= growth {
        return Err(MathError::bad_argument(format!(
            "perpetuity rate {rate} must exceed its growth {growth}"
        )));
    }
    Ok(payment * (1.0 + growth) / (rate - growth))
}

/// Level payments discounted at `rate1` for `periods1` periods, then at
/// `rate2` for `periods2` more.
#[must_use]
pub fn present_value_two_stage_annuity(
    payment: f64,
    rate1: f64,
    rate2: f64,
    periods1: u32,
    periods2: u32,
) -> f64 {
    let first = present_value_annuity(payment, rate1, periods1);
    let second = present_value_annuity(payment, rate2, periods2);
    first + second * discount(rate1, periods1)
}

/// A growing annuity for `periods1` periods followed by a growing
/// perpetuity.
///
/// The perpetuity starts from the last payment of the first stage, is
/// valued at `rate2` and `growth2`, and is brought back at `rate1`.
///
/// # Errors
///
/// `MathError::BadArgument` unless `rate2 > growth2`.
pub fn present_value_two_stage_perpetuity(
    payment: f64,
    rate1: f64,
    periods1: u32,
    rate2: f64,
    growth1: f64,
    growth2: f64,
) -> MathResult<f64> {
    let first = present_value_growing_annuity(payment, rate1, periods1, growth1);
    let base = payment * (1.0 + growth1).powf(f64::from(periods1));
    let tail = present_value_growing_perpetuity(base, rate2, growth2)?;
    Ok(first + tail * discount(rate1, periods1))
}

/// Value after `periods` periods of level payments.
///
/// # Example
///
/// ```rust
/// use yieldline_math::time_value::future_value_annuity;
///
/// let fv = future_value_annuity(100.0, 0.05, 10);
/// assert!((fv - 1257.789_253_554_9).abs() < 1e-9);
/// ```
#[must_use]
pub fn future_value_annuity(payment: f64, rate: f64, periods: u32) -> f64 {
    present_value_annuity(payment, rate, periods) / discount(rate, periods)
}

/// [`future_value_annuity`] for a nominal annual rate.
#[must_use]
pub fn future_value_annuity_annual(
    payment: f64,
    annual_rate: f64,
    years: u32,
    payments_per_year: u32,
) -> f64 {
    let (rate, periods) = per_period(annual_rate, years, payments_per_year);
    future_value_annuity(payment, rate, periods)
}

/// Value after `periods` periods of payments growing at `growth`.
#[must_use]
pub fn future_value_growing_annuity(payment: f64, rate: f64, periods: u32, growth: f64) -> f64 {
    present_value_growing_annuity(payment, rate, periods, growth) / discount(rate, periods)
}

/// Value after `periods1 + periods2` periods of a deposit that grows at
/// `growth1` and then at `growth2`.
///
/// The first deposit is `initial`. Second-stage growth compounds on the
/// last first-stage deposit.
#[must_use]
pub fn future_value_two_stage_growth(
    initial: f64,
    rate: f64,
    growth1: f64,
    periods1: u32,
    growth2: f64,
    periods2: u32,
) -> f64 {
    let total = periods1 + periods2;
    (0..total)
        .map(|t| {
            let deposit = if t < periods1 {
                initial * (1.0 + growth1).powf(f64::from(t))
            } else {
                initial
                    * (1.0 + growth1).powf(f64::from(periods1) - 1.0)
                    * (1.0 + growth2).powf(f64::from(t - periods1 + 1))
            };
            deposit * (1.0 + rate).powf(f64::from(total - t - 1))
        })
        .sum()
}

fn discount(rate: f64, periods: u32) -> f64 {
    (1.0 + rate).powf(-f64::from(periods))
}

fn per_period(annual_rate: f64, years: u32, payments_per_year: u32) -> (f64, u32) {
    (
        annual_rate / f64::from(payments_per_year),
        years * payments_per_year,
    )
}

/// Interest earned on `notional` under a given rate quotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterestBasis {
    /// Continuously compounded rate over `years`.
    Continuous {
        /// Rate.
        rate: f64,
        /// Holding period in years.
        years: f64,
    },
    /// Effective annual rate over `years`.
    Effective {
        /// Rate.
        rate: f64,
        /// Holding period in years.
        years: f64,
    },
    /// Nominal rate paid `periods_per_year` times, held `periods` periods.
    /// Simple interest, no compounding across periods.
    NominalPeriods {
        /// Annual nominal rate.
        rate: f64,
        /// Compounding periods per year.
        periods_per_year: u32,
        /// Periods held.
        periods: f64,
    },
    /// Nominal rate accrued over `days` of a `base_year`-day year.
    NominalDays {
        /// Annual nominal rate.
        rate: f64,
        /// Days held.
        days: u32,
        /// Days in the year.
        base_year: u32,
    },
    /// Money-market discount rate, or an add-on rate quoted on the amount
    /// invested: `notional · r · days / base`.
    MoneyMarket {
        /// Quoted rate.
        rate: f64,
        /// Days to maturity.
        days: u32,
        /// Day basis, usually 360.
        base: f64,
    },
    /// Add-on rate where `notional` is the amount repaid: interest is
    /// earned on `notional / (1 + r · days / base)`.
    MoneyMarketAddOnFace {
        /// Quoted rate.
        rate: f64,
        /// Days to maturity.
        days: u32,
        /// Day basis, usually 360.
        base: f64,
    },
    /// Bond-equivalent yield held `half_years` semi-annual periods.
    Bey {
        /// Bond-equivalent yield.
        rate: f64,
        /// Semi-annual periods held.
        half_years: u32,
    },
}

impl InterestBasis {
    /// Interest earned on `notional`.
    #[must_use]
    pub fn income(&self, notional: f64) -> f64 {
        match *self {
            InterestBasis::Continuous { rate, years } => notional * ((rate * years).exp() - 1.0),
            InterestBasis::Effective { rate, years } => {
                notional * ((1.0 + rate).powf(years) - 1.0)
            }
            InterestBasis::NominalPeriods {
                rate,
                periods_per_year,
                periods,
            } => notional * rate / f64::from(periods_per_year) * periods,
            InterestBasis::NominalDays {
                rate,
                days,
                base_year,
            } => notional * rate * f64::from(days) / f64::from(base_year),
            InterestBasis::MoneyMarket { rate, days, base } => {
                notional * rate * f64::from(days) / base
            }
            InterestBasis::MoneyMarketAddOnFace { rate, days, base } => {
                let accrual = rate * f64::from(days) / base;
                notional / (1.0 + accrual) * accrual
            }
            InterestBasis::Bey { rate, half_years } => {
                notional * rate / 2.0 * f64::from(half_years)
            }
        }
    }
}

/// Real rate by the approximate Fisher relation, `nominal − inflation`.
#[must_use]
pub fn fisher_real_rate(nominal: f64, inflation: f64) -> f64 {
    nominal - inflation
}

/// Real rate by the exact Fisher relation, `(1 + n) / (1 + i) − 1`.
#[must_use]
pub fn fisher_exact_real_rate(nominal: f64, inflation: f64) -> f64 {
    (1.0 + nominal) / (1.0 + inflation) - 1.0
}
