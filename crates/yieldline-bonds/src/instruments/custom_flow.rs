//! Bond with caller-defined amortization and coupons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use yieldline_core::{DayCountConvention, Date, YieldConvention};
use yieldline_math::solvers::SolverConfig;

use crate::cashflows::{CashFlowSchedule, CouponRates};
use crate::conventions::{
    ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
};
use crate::error::{BondError, BondResult};
use crate::instruments::fixed_rate::periodic_time_to_payments;
use crate::pricing::{coupon_yield_guess, price_from_yield_times, yield_from_times};
use crate::risk::{BumpSizes, SensitivitySums};
use crate::traits::{FixedIncome, YieldInstrument};
use crate::types::{InstrumentTerms, ValuationState};

/// A bond whose payments are given date by date.
///
/// Coupons are explicit amounts, or rates in percent of the notional still
/// outstanding; an explicit amount wins over a rate on the same date.
/// Without an amortization schedule the whole notional is repaid at
/// maturity. The bond has no regular coupon, so it accrues no interest.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use yieldline_bonds::prelude::*;
/// use yieldline_core::Date;
///
/// let d = |y| Date::from_ymd(y, 1, 1).unwrap();
/// let amortization: BTreeMap<Date, f64> =
///     [(d(2025), 30.0), (d(2026), 30.0), (d(2027), 40.0)].into_iter().collect();
///
/// let bond = CustomFlowBond::builder()
///     .issue_date(d(2025))
///     .maturity(d(2027))
///     .amortization(amortization)
///     .coupon_rates(CouponRates::Uniform(5.0))
///     .build()
///     .unwrap();
///
/// assert_eq!(bond.schedule().coupons()[&d(2026)], 3.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFlowBond {
    terms: InstrumentTerms,
    schedule: CashFlowSchedule,
    conventions: ConventionResolver,
    state: ValuationState,
    bumps: BumpSizes,
}

impl CustomFlowBond {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> CustomFlowBondBuilder {
        CustomFlowBondBuilder::default()
    }

    /// Notional outstanding after the payments made up to `date` inclusive.
    #[must_use]
    pub fn outstanding_notional(&self, date: Date) -> f64 {
        let repaid: f64 = self
            .schedule
            .amortization()
            .range(..=date)
            .map(|(_, amount)| amount)
            .sum();
        self.terms.notional - repaid
    }
}

impl FixedIncome for CustomFlowBond {
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

    fn accrued_interest_at(&self, _: Date, _: &ResolvedConventions) -> BondResult<f64> {
        Ok(0.0)
    }
}

impl YieldInstrument for CustomFlowBond {
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

/// Builder for [`CustomFlowBond`].
#[derive(Debug, Clone, Default)]
pub struct CustomFlowBondBuilder {
    issue_date: Option<Date>,
    maturity: Option<Date>,
    notional: Option<f64>,
    amortization: BTreeMap<Date, f64>,
    coupons: BTreeMap<Date, f64>,
    coupon_rates: CouponRates,
    settlement_t_plus: Option<u32>,
    record_date_t_minus: Option<u32>,
    settlement_date: Option<Date>,
    yield_to_maturity: Option<f64>,
    price: Option<f64>,
    conventions: ValuationOverrides,
    bumps: BumpSizes,
}

impl CustomFlowBondBuilder {
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

    /// Sets the notional (default 100).
    #[must_use]
    pub fn notional(mut self, notional: f64) -> Self {
        self.notional = Some(notional);
        self
    }

    /// Sets the principal repaid on each date.
    #[must_use]
    pub fn amortization(mut self, amortization: BTreeMap<Date, f64>) -> Self {
        self.amortization = amortization;
        self
    }

    /// Sets explicit coupon amounts by date.
    #[must_use]
    pub fn coupons(mut self, coupons: BTreeMap<Date, f64>) -> Self {
        self.coupons = coupons;
        self
    }

    /// Sets coupon rates on the outstanding notional.
    #[must_use]
    pub fn coupon_rates(mut self, rates: CouponRates) -> Self {
        self.coupon_rates = rates;
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

    /// Sets the day count of the following payments.
    #[must_use]
    pub fn following_coupons_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.conventions = self.conventions.with_following_coupons_day_count(day_count);
        self
    }

    /// Sets the yield convention.
    #[must_use]
    pub fn yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.conventions = self.conventions.with_yield_convention(yield_convention);
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
    /// Returns `BondError::AmortizationMismatch` if the amortization does not
    /// repay the notional, plus the errors of
    /// [`FixedRateBulletBuilder::build`](crate::instruments::FixedRateBulletBuilder::build).
    pub fn build(self) -> BondResult<CustomFlowBond> {
        let terms = InstrumentTerms {
            issue_date: self
                .issue_date
                .ok_or_else(|| BondError::missing_field("issue_date"))?,
            maturity: self
                .maturity
                .ok_or_else(|| BondError::missing_field("maturity"))?,
            notional: self.notional.unwrap_or(100.0),
            cpn: 0.0,
            cpn_freq: 0,
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

        let schedule = CashFlowSchedule::custom(
            terms.maturity,
            terms.notional,
            &self.amortization,
            &self.coupons,
            &self.coupon_rates,
        )?;

        let mut bond = CustomFlowBond {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValuationRequest;
    use approx::assert_relative_eq;

    fn d(y: i32) -> Date {
        Date::from_ymd(y, 1, 1).unwrap()
    }

    fn amortization() -> BTreeMap<Date, f64> {
        [(d(2025), 30.0), (d(2026), 30.0), (d(2027), 40.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_explicit_coupons() {
        let coupons = [(d(2025), 5.0), (d(2026), 4.0), (d(2027), 3.0)]
            .into_iter()
            .collect();
        let bond = CustomFlowBond::builder()
            .issue_date(d(2025))
            .maturity(d(2027))
            .amortization(amortization())
            .coupons(coupons)
            .build()
            .unwrap();

        let payments: Vec<f64> = bond.schedule().payments().values().copied().collect();
        assert_eq!(payments, vec![35.0, 34.0, 43.0]);
        assert_eq!(bond.outstanding_notional(d(2026)), 40.0);
    }

    #[test]
    fn test_rates_on_outstanding_notional() {
        let bond = CustomFlowBond::builder()
            .issue_date(d(2025))
            .maturity(d(2027))
            .amortization(amortization())
            .coupon_rates(CouponRates::Uniform(5.0))
            .build()
            .unwrap();
        let coupons: Vec<f64> = bond.schedule().coupons().values().copied().collect();
        assert_relative_eq!(coupons[0], 5.0);
        assert_relative_eq!(coupons[1], 3.5);
        assert_relative_eq!(coupons[2], 2.0);
    }

    #[test]
    fn test_amortization_must_repay_notional() {
        let short: BTreeMap<Date, f64> = [(d(2026), 30.0)].into_iter().collect();
        let result = CustomFlowBond::builder()
            .issue_date(d(2025))
            .maturity(d(2027))
            .amortization(short)
            .build();
        assert!(matches!(result, Err(BondError::AmortizationMismatch { .. })));
    }

    #[test]
    fn test_bullet_repayment_by_default() {
        let coupons = [(d(2026), 6.0), (d(2027), 6.0)].into_iter().collect();
        let bond = CustomFlowBond::builder()
            .issue_date(d(2025))
            .maturity(d(2027))
            .coupons(coupons)
            .build()
            .unwrap();
        assert_eq!(bond.schedule().amortization()[&d(2027)], 100.0);
        assert_eq!(
            bond.accrued_interest(&ValuationRequest::at(Date::from_ymd(2026, 6, 1).unwrap()))
                .unwrap(),
            0.0
        );

        let price = bond
            .price_from_yield(0.06, &ValuationRequest::at(d(2025)).with_yield_convention(YieldConvention::Annual))
            .unwrap();
        let ytm = bond
            .yield_to_maturity(
                &ValuationRequest::at(d(2025))
                    .with_price(price)
                    .with_yield_convention(YieldConvention::Annual),
            )
            .unwrap();
        assert_relative_eq!(ytm, 0.06, max_relative = 1e-6);
    }
}
