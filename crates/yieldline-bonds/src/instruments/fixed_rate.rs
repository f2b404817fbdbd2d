//! Fixed-rate bullet bond.
//!
//! Pays a fixed coupon `cpn/freq · notional/100` on dates generated
//! backwards from maturity and repays the whole notional at maturity. A
//! frequency of zero gives a zero-coupon bond.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use yieldline_core::daycounts::accrual_fraction;
use yieldline_core::{DayCount, DayCountConvention, Date, YieldConvention};
use yieldline_math::solvers::SolverConfig;

use crate::cashflows::{CashFlowSchedule, ScheduleConfig};
use crate::conventions::{
    ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
};
use crate::error::{BondError, BondResult};
use crate::pricing::{coupon_yield_guess, price_from_yield_times, yield_from_times};
use crate::risk::{BumpSizes, SensitivitySums};
use crate::traits::{FixedIncome, YieldInstrument};
use crate::types::{InstrumentTerms, ValuationState};

/// A fixed-rate bond repaying its notional at maturity.
///
/// Defaults: notional 100, T+1 settlement, T-1 record date, actual/actual
/// (Bond) accrual, 30/360 for following coupons, BEY yields and no
/// business-day adjustment.
///
/// # Example
///
/// ```rust
/// use yieldline_bonds::prelude::*;
/// use yieldline_core::{Date, YieldConvention};
///
/// let bond = FixedRateBullet::builder()
///     .issue_date(Date::from_ymd(2020, 1, 1).unwrap())
///     .maturity(Date::from_ymd(2025, 1, 1).unwrap())
///     .coupon_percent(5.0)
///     .frequency(1)
///     .yield_convention(YieldConvention::Annual)
///     .build()
///     .unwrap();
///
/// let price = bond
///     .price_from_yield(0.05, &ValuationRequest::new())
///     .unwrap();
/// assert!((price - 100.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedRateBullet {
    terms: InstrumentTerms,
    schedule: CashFlowSchedule,
    conventions: ConventionResolver,
    state: ValuationState,
    bumps: BumpSizes,
}

impl FixedRateBullet {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> FixedRateBulletBuilder {
        FixedRateBulletBuilder::default()
    }

    /// Coupon rate in percent.
    #[must_use]
    pub fn coupon_rate(&self) -> f64 {
        self.terms.cpn
    }

    /// Coupons per year.
    #[must_use]
    pub fn frequency(&self) -> u32 {
        self.terms.cpn_freq
    }

    /// Amount of each regular coupon.
    #[must_use]
    pub fn coupon_per_period(&self) -> f64 {
        self.terms.coupon_per_period()
    }
}

impl FixedIncome for FixedRateBullet {
    fn terms(&self) -> &InstrumentTerms {
        &self.terms
    }

    fn schedule(&self) -> &CashFlowSchedule {
        &self.schedule
    }

    fn state(&self) -> &ValuationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ValuationState {
        &mut self.state
    }

    fn conventions(&self) -> &ConventionResolver {
        &self.conventions
    }

    fn accrued_interest_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        coupon_accrued(self, settlement, conventions, self.terms.cpn / 100.0)
    }
}

impl YieldInstrument for FixedRateBullet {
    type Timing = Vec<(f64, f64)>;

    fn calculate_time_to_payments(
        &self,
        settlement: Date,
        price: Option<f64>,
        conventions: &ResolvedConventions,
    ) -> BondResult<Self::Timing> {
        periodic_time_to_payments(self, settlement, price, conventions)
    }

    fn price_from_timing(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        Ok(price_from_yield_times(timing, ytm, conventions.yield_convention))
    }

    fn yield_from_timing(
        &self,
        timing: &Self::Timing,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let guess = coupon_yield_guess(self.terms.cpn, conventions.yield_convention);
        yield_from_times(timing, guess, conventions.yield_convention, &SolverConfig::ytm())
    }

    fn sensitivity_sums(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<SensitivitySums> {
        Ok(SensitivitySums::from_times(timing, ytm, conventions.yield_convention))
    }

    fn bump_sizes(&self) -> BumpSizes {
        self.bumps
    }
}

/// Times the filtered flows of a periodic instrument.
///
/// Times run from the previous coupon date (the issue date before the
/// first coupon) under the following-coupons day count, less the accrual
/// elapsed up to settlement. Flows landing on the same time are summed.
pub(crate) fn periodic_time_to_payments<I: FixedIncome + ?Sized>(
    instrument: &I,
    settlement: Date,
    price: Option<f64>,
    conventions: &ResolvedConventions,
) -> BondResult<Vec<(f64, f64)>> {
    let flows = instrument
        .flow_filter(conventions)
        .apply(instrument.schedule().payments(), settlement, price);
    time_flows(instrument, flows, settlement, conventions)
}

/// Times already filtered dated flows the way
/// [`periodic_time_to_payments`] does.
pub(crate) fn time_flows<I: FixedIncome + ?Sized>(
    instrument: &I,
    flows: BTreeMap<Date, f64>,
    settlement: Date,
    conventions: &ResolvedConventions,
) -> BondResult<Vec<(f64, f64)>> {
    let start = instrument
        .previous_coupon_date(settlement)
        .unwrap_or(instrument.issue_date());
    let first_positive = flows
        .iter()
        .find(|(_, &amount)| amount > 0.0)
        .map(|(&date, _)| date);
    let elapsed = accrual_fraction(
        &conventions.day_count,
        start,
        settlement,
        instrument.terms().cpn_freq,
        first_positive,
    )?;

    let mut times = flows
        .into_iter()
        .map(|(date, amount)| -> BondResult<(f64, f64)> {
            let t = conventions
                .following_coupons_day_count
                .fraction(start, date, None)?;
            Ok((t - elapsed, amount))
        })
        .collect::<BondResult<Vec<(f64, f64)>>>()?;
    times.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(times.len());
    for (t, amount) in times {
        match merged.last_mut() {
            Some(last) if last.0 == t => last.1 += amount,
            _ => merged.push((t, amount)),
        }
    }
    Ok(merged)
}

/// Interest accrued since the previous coupon at `annual_rate` (decimal)
/// on the notional. Zero without coupons or past the last one.
pub(crate) fn coupon_accrued<I: FixedIncome + ?Sized>(
    instrument: &I,
    settlement: Date,
    conventions: &ResolvedConventions,
    annual_rate: f64,
) -> BondResult<f64> {
    let terms = instrument.terms();
    if terms.cpn_freq == 0 || annual_rate == 0.0 {
        return Ok(0.0);
    }
    let Some(next) = instrument.next_coupon_date(settlement) else {
        return Ok(0.0);
    };
    let start = instrument
        .previous_coupon_date(settlement)
        .unwrap_or(terms.issue_date);
    let fraction = accrual_fraction(
        &conventions.day_count,
        start,
        settlement,
        terms.cpn_freq,
        Some(next),
    )?;
    Ok(annual_rate * terms.notional * fraction)
}

/// Builder for [`FixedRateBullet`].
#[derive(Debug, Clone, Default)]
pub struct FixedRateBulletBuilder {
    issue_date: Option<Date>,
    maturity: Option<Date>,
    cpn: Option<f64>,
    cpn_freq: Option<u32>,
    notional: Option<f64>,
    settlement_t_plus: Option<u32>,
    record_date_t_minus: Option<u32>,
    settlement_date: Option<Date>,
    yield_to_maturity: Option<f64>,
    price: Option<f64>,
    conventions: ValuationOverrides,
    schedule_config: ScheduleConfig,
    bumps: BumpSizes,
}

impl FixedRateBulletBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issue date.
    #[must_use]
    pub fn issue_date(mut self, date: Date) -> Self {
        self.issue_date = Some(date);
        self
    }

    /// Sets the maturity date.
    #[must_use]
    pub fn maturity(mut self, date: Date) -> Self {
        self.maturity = Some(date);
        self
    }

    /// Sets the annual coupon rate in percent (5.0 for 5%).
    #[must_use]
    pub fn coupon_percent(mut self, cpn: f64) -> Self {
        self.cpn = Some(cpn);
        self
    }

    /// Sets the number of coupons per year.
    #[must_use]
    pub fn frequency(mut self, cpn_freq: u32) -> Self {
        self.cpn_freq = Some(cpn_freq);
        self
    }

    /// Sets the notional (default 100).
    #[must_use]
    pub fn notional(mut self, notional: f64) -> Self {
        self.notional = Some(notional);
        self
    }

    /// Sets the settlement lag in days (default 1).
    #[must_use]
    pub fn settlement_t_plus(mut self, days: u32) -> Self {
        self.settlement_t_plus = Some(days);
        self
    }

    /// Sets the record date lag in business days (default 1).
    #[must_use]
    pub fn record_date_t_minus(mut self, days: u32) -> Self {
        self.record_date_t_minus = Some(days);
        self
    }

    /// Sets the settlement date.
    #[must_use]
    pub fn settlement_date(mut self, date: Date) -> Self {
        self.settlement_date = Some(date);
        self
    }

    /// Quotes the bond at a yield on the settlement date.
    #[must_use]
    pub fn yield_to_maturity(mut self, ytm: f64) -> Self {
        self.yield_to_maturity = Some(ytm);
        self
    }

    /// Quotes the bond at a dirty price on the settlement date.
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets whether payment dates roll to the next business day.
    #[must_use]
    pub fn adjust_to_business_days(mut self, adjust: bool) -> Self {
        self.conventions = self.conventions.with_adjust_to_business_days(adjust);
        self
    }

    /// Sets the accrual day count.
    #[must_use]
    pub fn day_count(mut self, day_count: DayCountConvention) -> Self {
        self.conventions = self.conventions.with_day_count(day_count);
        self
    }

    /// Sets the day count of the following coupons.
    #[must_use]
    pub fn following_coupons_day_count(
        mut self,
        day_count: DayCountConvention,
    ) -> Self {
        self.conventions = self.conventions.with_following_coupons_day_count(day_count);
        self
    }

    /// Sets the yield convention.
    #[must_use]
    pub fn yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.conventions = self.conventions.with_yield_convention(yield_convention);
        self
    }

    /// Sets all conventions at once.
    #[must_use]
    pub fn conventions(mut self, conventions: ValuationOverrides) -> Self {
        self.conventions = conventions;
        self
    }

    /// Sets the coupon stub tolerance.
    #[must_use]
    pub fn schedule_config(mut self, config: ScheduleConfig) -> Self {
        self.schedule_config = config;
        self
    }

    /// Sets the effective-measure bump sizes.
    #[must_use]
    pub fn bump_sizes(mut self, bumps: BumpSizes) -> Self {
        self.bumps = bumps;
        self
    }

    /// Builds the bond and applies the initial quote.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, the terms are
    /// invalid, a convention is not accepted for bonds, or the yield and
    /// price disagree.
    pub fn build(self) -> BondResult<FixedRateBullet> {
        let terms = InstrumentTerms {
            issue_date: self
                .issue_date
                .ok_or_else(|| BondError::missing_field("issue_date"))?,
            maturity: self
                .maturity
                .ok_or_else(|| BondError::missing_field("maturity"))?,
            notional: self.notional.unwrap_or(100.0),
            cpn: self
                .cpn
                .ok_or_else(|| BondError::missing_field("cpn"))?,
            cpn_freq: self
                .cpn_freq
                .ok_or_else(|| BondError::missing_field("cpn_freq"))?,
            settlement_t_plus: self.settlement_t_plus.unwrap_or(1),
            record_date_t_minus: self.record_date_t_minus.unwrap_or(1),
        };
        terms.validate()?;

        let base = ConventionResolver::new(
            InstrumentFamily::Bond,
            ResolvedConventions::bond_defaults(),
        )?;
        let conventions =
            ConventionResolver::new(InstrumentFamily::Bond, base.resolve(&self.conventions)?)?;

        let schedule = CashFlowSchedule::periodic(
            terms.issue_date,
            terms.maturity,
            terms.notional,
            terms.coupon_per_period(),
            terms.cpn_freq,
            &self.schedule_config,
        )?;

        let mut bond = FixedRateBullet {
            terms,
            schedule,
            conventions,
            state: ValuationState::Unsettled,
            bumps: self.bumps,
        };
        bond.apply_initial_quote(self.settlement_date, self.yield_to_maturity, self.price)?;
        Ok(bond)
    }
}
