//! Money-market instruments.
//!
//! A money-market instrument makes a single payment at maturity: the
//! notional plus simple interest `cpn/freq · τ(issue, maturity) ·
//! notional/100`. Prices and yields use closed forms per convention, with
//! `d` and `b` the day-count numerator and denominator from settlement to
//! maturity:
//!
//! | convention | price                 |
//! |------------|-----------------------|
//! | Discount   | `cf·(1 − y·d/b)`      |
//! | Add-On     | `cf / (1 + y·d/b)`    |
//! | BEY        | `cf / (1 + y·d/365)`  |
//! | Annual     | `cf / (1 + y)^(d/365)`|
//! | Continuous | `cf·e^(−y·d/365)`     |

use serde::{Deserialize, Serialize};
use yieldline_core::{DayCount, DayCountConvention, Date, YieldConvention};

use crate::cashflows::CashFlowSchedule;
use crate::conventions::{
    ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
};
use crate::error::{BondError, BondResult};
use crate::risk::{BumpSizes, SensitivitySums};
use crate::traits::{FixedIncome, YieldInstrument};
use crate::types::{InstrumentTerms, ValuationState};

/// Market type of a money-market instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoneyMarketKind {
    /// Generic instrument (actual/365, Add-On).
    #[default]
    Generic,
    /// Treasury bill: discount instrument without coupon.
    TreasuryBill,
    /// Certificate of deposit: pays its coupon at maturity.
    CertificateOfDeposit,
    /// Commercial paper: discount instrument without coupon.
    CommercialPaper,
    /// Banker's acceptance: discount instrument without coupon.
    BankersAcceptance,
}

impl MoneyMarketKind {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MoneyMarketKind::Generic => "Money Market Instrument",
            MoneyMarketKind::TreasuryBill => "Treasury Bill",
            MoneyMarketKind::CertificateOfDeposit => "Certificate of Deposit",
            MoneyMarketKind::CommercialPaper => "Commercial Paper",
            MoneyMarketKind::BankersAcceptance => "Bankers Acceptance",
        }
    }

    /// Yield convention the market quotes in.
    #[must_use]
    pub fn yield_convention(&self) -> YieldConvention {
        match self {
            MoneyMarketKind::Generic | MoneyMarketKind::CertificateOfDeposit => {
                YieldConvention::AddOn
            }
            MoneyMarketKind::TreasuryBill
            | MoneyMarketKind::CommercialPaper
            | MoneyMarketKind::BankersAcceptance => YieldConvention::Discount,
        }
    }

    /// Day count the market accrues on.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        match self {
            MoneyMarketKind::Generic => DayCountConvention::Act365,
            _ => DayCountConvention::Act360,
        }
    }
}

/// The single remaining payment of a money-market instrument, timed in
/// day-count days from settlement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneyMarketTiming {
    /// Day-count numerator from settlement to maturity.
    pub days: f64,
    /// Day-count denominator of the period.
    pub base: f64,
    /// Payment at maturity; `None` once the instrument has expired.
    pub flow: Option<f64>,
    /// Dirty price paid on settlement.
    pub price: Option<f64>,
}

/// A single-payment instrument quoted on a money-market yield basis.
///
/// # Example
///
/// ```rust
/// use yieldline_bonds::prelude::*;
/// use yieldline_core::Date;
///
/// let issue = Date::from_ymd(2025, 1, 2).unwrap();
/// let bill = MoneyMarketInstrument::treasury_bill(issue, issue.add_days(90))
///     .build()
///     .unwrap();
///
/// let price = bill.price_from_yield(0.05, &ValuationRequest::new()).unwrap();
/// assert!((price - 98.75).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyMarketInstrument {
    kind: MoneyMarketKind,
    terms: InstrumentTerms,
    schedule: CashFlowSchedule,
    conventions: ConventionResolver,
    state: ValuationState,
    bumps: BumpSizes,
}

impl MoneyMarketInstrument {
    /// Creates a builder for a generic instrument.
    #[must_use]
    pub fn builder() -> MoneyMarketBuilder {
        MoneyMarketBuilder::default()
    }

    /// Treasury bill: actual/360, Discount, no coupon.
    #[must_use]
    pub fn treasury_bill(issue_date: Date, maturity: Date) -> MoneyMarketBuilder {
        MoneyMarketBuilder::for_kind(MoneyMarketKind::TreasuryBill)
            .issue_date(issue_date)
            .maturity(maturity)
    }

    /// Certificate of deposit: actual/360, Add-On, coupon in percent paid
    /// at maturity.
    #[must_use]
    pub fn certificate_of_deposit(issue_date: Date, maturity: Date, cpn: f64) -> MoneyMarketBuilder {
        MoneyMarketBuilder::for_kind(MoneyMarketKind::CertificateOfDeposit)
            .issue_date(issue_date)
            .maturity(maturity)
            .coupon_percent(cpn)
    }

    /// Commercial paper: actual/360, Discount, no coupon.
    #[must_use]
    pub fn commercial_paper(issue_date: Date, maturity: Date) -> MoneyMarketBuilder {
        MoneyMarketBuilder::for_kind(MoneyMarketKind::CommercialPaper)
            .issue_date(issue_date)
            .maturity(maturity)
    }

    /// Banker's acceptance: actual/360, Discount, no coupon.
    #[must_use]
    pub fn bankers_acceptance(issue_date: Date, maturity: Date) -> MoneyMarketBuilder {
        MoneyMarketBuilder::for_kind(MoneyMarketKind::BankersAcceptance)
            .issue_date(issue_date)
            .maturity(maturity)
    }

    /// Generic instrument maturing `days` calendar days after issue, on
    /// actual/360.
    #[must_use]
    pub fn from_days(days: i64, issue_date: Date) -> MoneyMarketBuilder {
        MoneyMarketBuilder::default()
            .issue_date(issue_date)
            .maturity(issue_date.add_days(days))
            .day_count(DayCountConvention::Act360)
    }

    /// Market type.
    #[must_use]
    pub fn kind(&self) -> MoneyMarketKind {
        self.kind
    }

    /// Payment at maturity.
    #[must_use]
    pub fn redemption_amount(&self) -> f64 {
        self.schedule.payments().values().sum()
    }
}

impl FixedIncome for MoneyMarketInstrument {
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

    /// `cpn/freq · τ(issue, settlement) · notional/100`.
    fn accrued_interest_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let terms = &self.terms;
        if terms.cpn_freq == 0 || terms.cpn == 0.0 {
            return Ok(0.0);
        }
        let t = conventions
            .day_count
            .fraction(terms.issue_date, settlement, None)?;
        Ok(terms.cpn / f64::from(terms.cpn_freq) * t * terms.notional / 100.0)
    }
}

impl YieldInstrument for MoneyMarketInstrument {
    type Timing = MoneyMarketTiming;

    fn calculate_time_to_payments(
        &self,
        settlement: Date,
        price: Option<f64>,
        conventions: &ResolvedConventions,
    ) -> BondResult<Self::Timing> {
        let flows = self
            .flow_filter(conventions)
            .apply(self.schedule.payments(), settlement, None);
        let Some((&maturity, &flow)) = flows.iter().next_back() else {
            return Ok(MoneyMarketTiming {
                days: 0.0,
                base: 0.0,
                flow: None,
                price,
            });
        };
        let dc = conventions.day_count;
        Ok(MoneyMarketTiming {
            days: dc.numerator(settlement, maturity, Some(maturity))?,
            base: dc.denominator(settlement, settlement, Some(maturity))?,
            flow: Some(flow),
            price,
        })
    }

    fn price_from_timing(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let Some(cf) = timing.flow else {
            return Ok(0.0);
        };
        let (d, b) = (timing.days, timing.base);
        let price = match conventions.yield_convention {
            YieldConvention::Discount => cf * (1.0 - ytm * d / b),
            YieldConvention::AddOn => cf / (1.0 + ytm * d / b),
            YieldConvention::Bey => cf / (1.0 + ytm * d / 365.0),
            YieldConvention::Annual => cf / (1.0 + ytm).powf(d / 365.0),
            YieldConvention::Continuous => cf * (-ytm * d / 365.0).exp(),
            other => return Err(self.conventions.family().unsupported_yield_convention(other)),
        };
        Ok(price)
    }

    fn yield_from_timing(
        &self,
        timing: &Self::Timing,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let (Some(cf), Some(price)) = (timing.flow, timing.price) else {
            return Err(BondError::invalid_spec(
                "a money-market yield needs one remaining payment and a price",
            ));
        };
        if timing.days <= 0.0 {
            return Err(BondError::invalid_spec(
                "a money-market yield needs settlement before maturity",
            ));
        }
        if price <= 0.0 {
            return Err(BondError::invalid_spec(
                "a money-market yield needs a positive price",
            ));
        }
        let (d, b) = (timing.days, timing.base);
        let ratio = cf / price;
        let ytm = match conventions.yield_convention {
            YieldConvention::Discount => (1.0 - price / cf) * b / d,
            YieldConvention::AddOn => (ratio - 1.0) * b / d,
            YieldConvention::Bey => (ratio - 1.0) * 365.0 / d,
            YieldConvention::Annual => ratio.powf(365.0 / d) - 1.0,
            YieldConvention::Continuous => ratio.ln() * 365.0 / d,
            other => return Err(self.conventions.family().unsupported_yield_convention(other)),
        };
        Ok(ytm)
    }

    /// Closed-form sums per convention, with `τ = d/b` (Discount, Add-On)
    /// or `d/365` (the rest).
    fn sensitivity_sums(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<SensitivitySums> {
        let Some(cf) = timing.flow else {
            return Ok(SensitivitySums::default());
        };
        let (d, b) = (timing.days, timing.base);
        let sums = match conventions.yield_convention {
            YieldConvention::Continuous => {
                let tau = d / 365.0;
                let pv = cf * (-ytm * tau).exp();
                SensitivitySums {
                    modified: pv * tau,
                    macaulay: pv * tau,
                    convexity: pv * tau * tau,
                }
            }
            YieldConvention::Annual => {
                let tau = d / 365.0;
                SensitivitySums {
                    modified: cf / (1.0 + ytm).powf(tau + 1.0) * tau,
                    macaulay: cf * tau / (1.0 + ytm).powf(tau),
                    convexity: cf / (1.0 + ytm).powf(tau + 2.0) * tau * (tau + 1.0),
                }
            }
            YieldConvention::AddOn | YieldConvention::Bey => {
                let tau = if conventions.yield_convention == YieldConvention::AddOn {
                    d / b
                } else {
                    d / 365.0
                };
                let growth = 1.0 + ytm * tau;
                SensitivitySums {
                    modified: cf / growth.powi(2) * tau,
                    macaulay: cf * tau / growth,
                    convexity: 2.0 * cf / growth.powi(3) * tau * tau,
                }
            }
            YieldConvention::Discount => {
                let tau = d / b;
                SensitivitySums {
                    modified: cf * tau,
                    macaulay: cf * tau,
                    convexity: 0.0,
                }
            }
            other => return Err(self.conventions.family().unsupported_yield_convention(other)),
        };
        Ok(sums)
    }

    fn bump_sizes(&self) -> BumpSizes {
        self.bumps
    }
}

/// Builder for [`MoneyMarketInstrument`].
#[derive(Debug, Clone, Default)]
pub struct MoneyMarketBuilder {
    kind: MoneyMarketKind,
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
    bumps: BumpSizes,
}

impl MoneyMarketBuilder {
    /// Creates a builder with the conventions of `kind`.
    #[must_use]
    pub fn for_kind(kind: MoneyMarketKind) -> Self {
        Self {
            kind,
            conventions: ValuationOverrides::new()
                .with_day_count(kind.day_count())
                .with_yield_convention(kind.yield_convention()),
            ..Self::default()
        }
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

    /// Sets the annual coupon rate in percent.
    #[must_use]
    pub fn coupon_percent(mut self, cpn: f64) -> Self {
        self.cpn = Some(cpn);
        self
    }

    /// Sets the coupon frequency (default 1).
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

    /// Quotes the instrument at a yield on the settlement date.
    #[must_use]
    pub fn yield_to_maturity(mut self, ytm: f64) -> Self {
        self.yield_to_maturity = Some(ytm);
        self
    }

    /// Quotes the instrument at a dirty price on the settlement date.
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets whether the maturity rolls to the next business day.
    #[must_use]
    pub fn adjust_to_business_days(mut self, adjust: bool) -> Self {
        self.conventions = self.conventions.with_adjust_to_business_days(adjust);
        self
    }

    /// Sets the day count.
    #[must_use]
    pub fn day_count(mut self, day_count: DayCountConvention) -> Self {
        self.conventions = self.conventions.with_day_count(day_count);
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

    /// Builds the instrument and applies the initial quote.
    ///
    /// # Errors
    ///
    /// Returns an error if a date is missing, the terms are invalid, the
    /// yield convention is not a money-market one, or the quote is
    /// inconsistent.
    pub fn build(self) -> BondResult<MoneyMarketInstrument> {
        let terms = InstrumentTerms {
            issue_date: self
                .issue_date
                .ok_or_else(|| BondError::missing_field("issue_date"))?,
            maturity: self
                .maturity
                .ok_or_else(|| BondError::missing_field("maturity"))?,
            notional: self.notional.unwrap_or(100.0),
            cpn: self.cpn.unwrap_or(0.0),
            cpn_freq: self.cpn_freq.unwrap_or(1),
            settlement_t_plus: self.settlement_t_plus.unwrap_or(1),
            record_date_t_minus: self.record_date_t_minus.unwrap_or(1),
        };
        terms.validate()?;

        let base = ConventionResolver::new(
            InstrumentFamily::MoneyMarket,
            ResolvedConventions::money_market_defaults(),
        )?;
        let defaults = base.resolve(&self.conventions)?;
        let conventions = ConventionResolver::new(InstrumentFamily::MoneyMarket, defaults)?;

        let coupon = if terms.cpn > 0.0 {
            let year_fraction = defaults
                .day_count
                .fraction(terms.issue_date, terms.maturity, None)?;
            terms.cpn / f64::from(terms.cpn_freq) * year_fraction * terms.notional / 100.0
        } else {
            0.0
        };
        let schedule = CashFlowSchedule::single(terms.maturity, terms.notional, coupon);

        let mut instrument = MoneyMarketInstrument {
            kind: self.kind,
            terms,
            schedule,
            conventions,
            state: ValuationState::Unsettled,
            bumps: self.bumps,
        };
        instrument.apply_initial_quote(self.settlement_date, self.yield_to_maturity, self.price)?;
        Ok(instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValuationRequest;
    use approx::assert_relative_eq;

    fn issue() -> Date {
        Date::from_ymd(2025, 1, 2).unwrap()
    }

    fn bill() -> MoneyMarketInstrument {
        MoneyMarketInstrument::treasury_bill(issue(), issue().add_days(90))
            .build()
            .unwrap()
    }

    #[test]
    fn test_kind_defaults() {
        let bill = bill();
        assert_eq!(bill.kind(), MoneyMarketKind::TreasuryBill);
        let defaults = bill.conventions().defaults();
        assert_eq!(defaults.day_count, DayCountConvention::Act360);
        assert_eq!(defaults.yield_convention, YieldConvention::Discount);
        assert_eq!(bill.terms().cpn, 0.0);
        assert_eq!(bill.terms().cpn_freq, 1);

        let generic = MoneyMarketInstrument::builder()
            .issue_date(issue())
            .maturity(issue().add_days(30))
            .build()
            .unwrap();
        assert_eq!(
            generic.conventions().defaults().yield_convention,
            YieldConvention::AddOn
        );
    }

    #[test]
    fn test_discount_round_trip() {
        let bill = bill();
        let request = ValuationRequest::new();
        let price = bill.price_from_yield(0.05, &request).unwrap();
        assert_relative_eq!(price, 98.75, epsilon = 1e-12);

        let ytm = bill.yield_to_maturity(&request.with_price(price)).unwrap();
        assert_relative_eq!(ytm, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_every_convention_inverts() {
        let bill = bill();
        for convention in [
            YieldConvention::Discount,
            YieldConvention::AddOn,
            YieldConvention::Bey,
            YieldConvention::Annual,
            YieldConvention::Continuous,
        ] {
            let request = ValuationRequest::new().with_yield_convention(convention);
            let price = bill.price_from_yield(0.045, &request).unwrap();
            let ytm = bill.yield_to_maturity(&request.with_price(price)).unwrap();
            assert_relative_eq!(ytm, 0.045, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_rejects_bond_convention() {
        let result = MoneyMarketInstrument::treasury_bill(issue(), issue().add_days(90))
            .yield_convention(YieldConvention::BeyQ)
            .build();
        assert!(matches!(
            result,
            Err(BondError::UnsupportedConvention { family: "money market instruments", .. })
        ));
    }

    #[test]
    fn test_certificate_of_deposit() {
        let cd = MoneyMarketInstrument::certificate_of_deposit(issue(), issue().add_days(180), 4.0)
            .build()
            .unwrap();
        assert_relative_eq!(cd.redemption_amount(), 102.0, epsilon = 1e-12);

        let accrued = cd
            .accrued_interest(&ValuationRequest::at(issue().add_days(90)))
            .unwrap();
        assert_relative_eq!(accrued, 1.0, epsilon = 1e-12);

        let price = cd
            .price_from_yield(0.04, &ValuationRequest::new())
            .unwrap();
        assert_relative_eq!(price, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_days() {
        let paper = MoneyMarketInstrument::from_days(60, issue()).build().unwrap();
        assert_eq!(paper.maturity(), issue().add_days(60));
        assert_eq!(
            paper.conventions().defaults().day_count,
            DayCountConvention::Act360
        );
    }

    #[test]
    fn test_analytic_matches_effective_duration() {
        for convention in [YieldConvention::AddOn, YieldConvention::Annual, YieldConvention::Continuous] {
            let cp = MoneyMarketInstrument::commercial_paper(issue(), issue().add_days(120))
                .build()
                .unwrap();
            let request = ValuationRequest::new()
                .with_yield(0.05)
                .with_yield_convention(convention);
            let analytic = cp.modified_duration(&request).unwrap();
            let effective = cp.effective_duration(&request).unwrap();
            assert_relative_eq!(analytic, effective, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_expired_instrument_prices_at_zero() {
        let bill = bill();
        let request = ValuationRequest::at(issue().add_days(120));
        assert_eq!(bill.price_from_yield(0.05, &request).unwrap(), 0.0);
        assert!(bill.cash_flows(Some(issue().add_days(120))).unwrap().is_empty());
    }
}
