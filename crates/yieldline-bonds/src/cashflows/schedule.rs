//! Contractual payment schedules and their settlement filter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;
use yieldline_core::{CashFlow, Date};

use crate::error::{BondError, BondResult};

/// Share of a coupon period below which a leading stub is dropped.
pub const STUB_TOLERANCE: f64 = 0.99;

/// Relative tolerance when checking that amortization repays the notional.
const AMORTIZATION_TOLERANCE: f64 = 1e-9;

/// Tunables of schedule generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// A coupon date closer to issue than this share of a period is not
    /// generated.
    pub stub_tolerance: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            stub_tolerance: STUB_TOLERANCE,
        }
    }
}

impl ScheduleConfig {
    /// Sets the stub tolerance.
    #[must_use]
    pub fn with_stub_tolerance(mut self, stub_tolerance: f64) -> Self {
        self.stub_tolerance = stub_tolerance;
        self
    }

    /// Minimum number of days between issue and the first generated coupon.
    fn min_first_period_days(&self, cpn_freq: u32) -> i64 {
        (365.0 * self.stub_tolerance / f64::from(cpn_freq)).floor() as i64
    }
}

/// Coupon rates applied to the remaining notional of a custom-flow bond.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CouponRates {
    /// No rate-based coupons.
    #[default]
    None,
    /// One rate, in percent, on every payment date.
    Uniform(f64),
    /// A rate in percent per date. Dates without a rate pay no coupon.
    PerDate(BTreeMap<Date, f64>),
}

impl CouponRates {
    fn rate_on(&self, date: Date) -> Option<f64> {
        match self {
            CouponRates::None => None,
            CouponRates::Uniform(rate) => Some(*rate),
            CouponRates::PerDate(rates) => Some(rates.get(&date).copied().unwrap_or(0.0)),
        }
    }

    fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        let rates = match self {
            CouponRates::PerDate(rates) => Some(rates),
            _ => None,
        };
        rates.into_iter().flat_map(|rates| rates.keys().copied())
    }
}

/// Payments of an instrument split into coupon and principal.
///
/// On every date `coupons + amortization == payments`, and the amortization
/// adds up to the notional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    payments: BTreeMap<Date, f64>,
    coupons: BTreeMap<Date, f64>,
    amortization: BTreeMap<Date, f64>,
}

impl CashFlowSchedule {
    /// Generates a periodic schedule backwards from maturity.
    ///
    /// Coupon dates step back `12 / cpn_freq` months at a time, each
    /// computed from maturity, until a candidate falls within the stub
    /// tolerance of the issue date. The notional is repaid at maturity
    /// together with the last coupon. A frequency of zero or a coupon that
    /// is not positive gives a single principal payment.
    ///
    /// # Arguments
    ///
    /// * `issue` - Issue date
    /// * `maturity` - Maturity date
    /// * `notional` - Principal repaid at maturity
    /// * `coupon` - Amount paid on every coupon date
    /// * `cpn_freq` - Coupons per year
    /// * `config` - Stub tolerance
    pub fn periodic(
        issue: Date,
        maturity: Date,
        notional: f64,
        coupon: f64,
        cpn_freq: u32,
        config: &ScheduleConfig,
    ) -> BondResult<Self> {
        check_frequency(cpn_freq)?;
        if cpn_freq == 0 || coupon <= 0.0 {
            return Ok(Self::single(maturity, notional, 0.0));
        }
        Self::floating(issue, maturity, notional, coupon, cpn_freq, config)
    }

    /// Generates the reset dates of a floating-rate note.
    ///
    /// Dates are laid out as in [`CashFlowSchedule::periodic`], but every
    /// date is recorded as a coupon date even when the fixed part `spread`
    /// is zero, since the projected reference rate is added on top.
    pub fn floating(
        issue: Date,
        maturity: Date,
        notional: f64,
        spread: f64,
        cpn_freq: u32,
        config: &ScheduleConfig,
    ) -> BondResult<Self> {
        check_frequency(cpn_freq)?;
        let mut schedule = Self::default();
        if cpn_freq == 0 {
            schedule.insert(maturity, 0.0, notional, false);
            return Ok(schedule);
        }

        schedule.insert(maturity, spread, notional, true);

        let step = (12 / cpn_freq) as i32;
        let min_days = config.min_first_period_days(cpn_freq);
        let candidates = (issue.days_between(&maturity) / 365) * i64::from(cpn_freq) + 1;
        for k in 1..=candidates {
            let date = maturity.add_months(-step * k as i32)?;
            if issue.days_between(&date) < min_days {
                break;
            }
            schedule.insert(date, spread, 0.0, true);
        }
        trace!(payments = schedule.payments.len(), "generated periodic schedule");
        Ok(schedule)
    }

    /// Builds a schedule from explicit amortization, coupons and rates.
    ///
    /// Dates are the union of every key plus maturity. Walking them in
    /// order, an explicit coupon wins over a rate, rates apply to the
    /// notional still outstanding, and without an amortization schedule
    /// the remaining notional is repaid at maturity.
    ///
    /// # Errors
    ///
    /// Returns `BondError::InvalidSpec` for dates after maturity and
    /// `BondError::AmortizationMismatch` if the amortization does not add up
    /// to the notional.
    pub fn custom(
        maturity: Date,
        notional: f64,
        amortization: &BTreeMap<Date, f64>,
        coupons: &BTreeMap<Date, f64>,
        coupon_rates: &CouponRates,
    ) -> BondResult<Self> {
        let mut dates: Vec<Date> = amortization
            .keys()
            .chain(coupons.keys())
            .copied()
            .chain(coupon_rates.dates())
            .chain(std::iter::once(maturity))
            .collect();
        dates.sort_unstable();
        dates.dedup();

        if let Some(late) = dates.iter().find(|&&date| date > maturity) {
            return Err(BondError::invalid_spec(format!(
                "payment date {late} is after maturity {maturity}"
            )));
        }

        let mut schedule = Self::default();
        let mut remaining = notional;
        for date in dates {
            let amort = if amortization.is_empty() {
                if date == maturity {
                    remaining
                } else {
                    0.0
                }
            } else {
                amortization.get(&date).copied().unwrap_or(0.0)
            };
            let coupon = match coupons.get(&date) {
                Some(&coupon) => coupon,
                None => coupon_rates
                    .rate_on(date)
                    .map_or(0.0, |rate| remaining * rate / 100.0),
            };
            schedule.insert(date, coupon, amort, true);
            remaining -= amort;
        }

        let total = schedule.total_amortization();
        if (total - notional).abs() > AMORTIZATION_TOLERANCE * notional.abs().max(1.0) {
            return Err(BondError::AmortizationMismatch {
                notional,
                amortization: total,
            });
        }
        Ok(schedule)
    }

    /// A single payment of notional plus `coupon` at maturity. The coupon
    /// is recorded only when positive.
    #[must_use]
    pub fn single(maturity: Date, notional: f64, coupon: f64) -> Self {
        let mut schedule = Self::default();
        schedule.insert(maturity, coupon, notional, coupon > 0.0);
        schedule
    }

    fn insert(&mut self, date: Date, coupon: f64, amortization: f64, record_coupon: bool) {
        self.payments.insert(date, coupon + amortization);
        if record_coupon {
            self.coupons.insert(date, coupon);
        }
        self.amortization.insert(date, amortization);
    }

    /// Total payment per date.
    #[must_use]
    pub fn payments(&self) -> &BTreeMap<Date, f64> {
        &self.payments
    }

    /// Coupon per date.
    #[must_use]
    pub fn coupons(&self) -> &BTreeMap<Date, f64> {
        &self.coupons
    }

    /// Principal repaid per date.
    #[must_use]
    pub fn amortization(&self) -> &BTreeMap<Date, f64> {
        &self.amortization
    }

    /// Sum of the principal payments.
    #[must_use]
    pub fn total_amortization(&self) -> f64 {
        self.amortization.values().sum()
    }

    /// Payments as dated cash flows.
    #[must_use]
    pub fn to_cash_flows(&self) -> Vec<CashFlow> {
        self.payments
            .iter()
            .map(|(&date, &amount)| CashFlow::new(date, amount))
            .collect()
    }

    /// First coupon date on or after the record date of `settlement`.
    #[must_use]
    pub fn next_coupon_date(&self, settlement: Date, record_lag: i32) -> Option<Date> {
        let record = settlement.add_business_days(record_lag);
        self.coupons.range(record..).next().map(|(&date, _)| date)
    }

    /// Last coupon date strictly before the record date of `settlement`.
    #[must_use]
    pub fn previous_coupon_date(&self, settlement: Date, record_lag: i32) -> Option<Date> {
        let record = settlement.add_business_days(record_lag);
        self.coupons.range(..record).next_back().map(|(&date, _)| date)
    }
}

fn check_frequency(cpn_freq: u32) -> BondResult<()> {
    if cpn_freq != 0 && 12 % cpn_freq != 0 {
        return Err(BondError::invalid_spec(format!(
            "coupon frequency {cpn_freq} does not divide twelve months"
        )));
    }
    Ok(())
}

/// Keeps the payments a buyer settling on a date is entitled to.
///
/// With business-day adjustment on, weekend dates roll to the following
/// Monday and flows are keyed by their rolled date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowFilter {
    /// Contractual maturity.
    pub maturity: Date,
    /// Business days before a payment at which its holder is fixed.
    pub record_date_t_minus: u32,
    /// Roll weekend dates forward.
    pub adjust_to_business_days: bool,
}

impl FlowFilter {
    /// Rolls `date` if adjustment is on.
    #[must_use]
    pub fn adjust(&self, date: Date) -> Date {
        if self.adjust_to_business_days {
            date.roll_following()
        } else {
            date
        }
    }

    /// Filters `flows` for a buyer settling on `settlement`.
    ///
    /// The result is empty once settlement is past the (adjusted) maturity.
    /// A price is carried as `-price` on the settlement date. A payment is
    /// kept if its adjusted date is on or after the record date of
    /// settlement, and maturity is kept up to and including its own date.
    #[must_use]
    pub fn apply(
        &self,
        flows: &BTreeMap<Date, f64>,
        settlement: Date,
        price: Option<f64>,
    ) -> BTreeMap<Date, f64> {
        let mut filtered = BTreeMap::new();
        if settlement > self.adjust(self.maturity) {
            return filtered;
        }
        if let Some(price) = price {
            filtered.insert(settlement, -price);
        }

        let record = settlement.add_business_days(self.record_date_t_minus as i32);
        for (&date, &amount) in flows {
            let adjusted = self.adjust(date);
            let at_maturity = date == self.maturity && settlement <= date;
            if record <= adjusted || at_maturity {
                *filtered.entry(adjusted).or_insert(0.0) += amount;
            }
        }
        filtered
    }
}
