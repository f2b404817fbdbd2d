//! Interest rate conversions.
//!
//! All conversions go through the effective annual rate (EAR). Money-market
//! conversions additionally need the day count of the period and the
//! year basis.

use crate::conventions::YieldConvention;
use crate::error::{CoreError, CoreResult};

/// `base^n - 1`, computed without cancellation for small rates.
#[inline]
fn pow_minus_one(base: f64, n: f64) -> f64 {
    (n * base.ln()).exp_m1()
}

fn check_effective(effective_rate: f64) -> CoreResult<()> {
    if effective_rate <= -1.0 || !effective_rate.is_finite() {
        return Err(CoreError::invalid_rate(
            effective_rate,
            "effective rate must be greater than -100%",
        ));
    }
    Ok(())
}

/// Continuously compounded rate to effective annual rate.
#[must_use]
pub fn continuous_to_effective(rate: f64) -> f64 {
    rate.exp_m1()
}

/// Effective annual rate to continuously compounded rate.
pub fn effective_to_continuous(effective_rate: f64) -> CoreResult<f64> {
    check_effective(effective_rate)?;
    Ok(effective_rate.ln_1p())
}

/// Nominal rate compounded `periods_per_year` times to effective annual rate.
#[must_use]
pub fn nominal_periods_to_effective(nominal_rate: f64, periods_per_year: u32) -> f64 {
    let n = f64::from(periods_per_year.max(1));
    pow_minus_one(1.0 + nominal_rate / n, n)
}

/// Effective annual rate to a nominal rate compounded `periods_per_year` times.
pub fn effective_to_nominal_periods(effective_rate: f64, periods_per_year: u32) -> CoreResult<f64> {
    check_effective(effective_rate)?;
    let n = f64::from(periods_per_year.max(1));
    Ok(pow_minus_one(1.0 + effective_rate, 1.0 / n) * n)
}

/// Bond equivalent yield to effective annual rate: `(1 + bey/2)^2 - 1`.
#[must_use]
pub fn bey_to_effective_annual(bey: f64) -> f64 {
    nominal_periods_to_effective(bey, 2)
}

/// Effective annual rate to bond equivalent yield.
pub fn effective_annual_to_bey(effective_rate: f64) -> CoreResult<f64> {
    effective_to_nominal_periods(effective_rate, 2)
}

fn check_period(days: f64, base: f64) -> CoreResult<()> {
    if days <= 0.0 || base <= 0.0 {
        return Err(CoreError::invalid_rate(
            days,
            format!("money market period needs positive days and base, got {days}/{base}"),
        ));
    }
    Ok(())
}

/// Money-market rate over `days` on a `base`-day year to effective annual rate.
///
/// Add-on: `(1 + mmr·d/b)^(b/d) - 1`. Discount: `(1 / (1 - mmr·d/b))^(b/d) - 1`.
pub fn money_market_rate_to_effective(
    mmr: f64,
    days: f64,
    base: f64,
    discount: bool,
) -> CoreResult<f64> {
    check_period(days, base)?;
    let growth = if discount {
        1.0 / (1.0 - mmr * days / base)
    } else {
        1.0 + mmr * days / base
    };
    if growth <= 0.0 {
        return Err(CoreError::invalid_rate(
            mmr,
            "money market rate implies a non-positive growth factor",
        ));
    }
    Ok(pow_minus_one(growth, base / days))
}

/// Effective annual rate to money-market rate over `days` on a `base`-day year.
pub fn effective_to_money_market_rate(
    effective_rate: f64,
    days: f64,
    base: f64,
    discount: bool,
) -> CoreResult<f64> {
    check_effective(effective_rate)?;
    check_period(days, base)?;
    let growth = (1.0 + effective_rate).powf(days / base);
    if discount {
        Ok((1.0 - 1.0 / growth) * (base / days))
    } else {
        Ok((growth - 1.0) * base / days)
    }
}

/// Rate in `from` to effective annual rate.
pub fn to_effective(rate: f64, from: YieldConvention) -> CoreResult<f64> {
    match from {
        YieldConvention::Continuous => Ok(continuous_to_effective(rate)),
        YieldConvention::AddOn | YieldConvention::Discount => {
            Err(CoreError::UnsupportedConversion {
                from: from.name(),
                to: YieldConvention::Annual.name(),
            })
        }
        periodic => Ok(nominal_periods_to_effective(
            rate,
            periodic.periods_per_year().unwrap_or(1),
        )),
    }
}

/// Effective annual rate to a rate in `to`.
pub fn from_effective(effective_rate: f64, to: YieldConvention) -> CoreResult<f64> {
    match to {
        YieldConvention::Annual => Ok(effective_rate),
        YieldConvention::Continuous => effective_to_continuous(effective_rate),
        YieldConvention::AddOn | YieldConvention::Discount => {
            Err(CoreError::UnsupportedConversion {
                from: YieldConvention::Annual.name(),
                to: to.name(),
            })
        }
        periodic => {
            effective_to_nominal_periods(effective_rate, periodic.periods_per_year().unwrap_or(1))
        }
    }
}

/// Converts a yield between compounding conventions.
///
/// Identical conventions return the rate untouched. Money-market
/// conventions cannot be converted without a period length and return
/// `CoreError::UnsupportedConversion`.
///
/// # Example
///
/// ```rust
/// use yieldline_core::conventions::YieldConvention;
/// use yieldline_core::rates::convert_yield;
///
/// let annual = convert_yield(0.05, YieldConvention::Bey, YieldConvention::Annual).unwrap();
/// assert!((annual - 0.050625).abs() < 1e-12);
/// ```
pub fn convert_yield(rate: f64, from: YieldConvention, to: YieldConvention) -> CoreResult<f64> {
    if from == to {
        return Ok(rate);
    }
    from_effective(to_effective(rate, from)?, to)
}
