//! The capability shared by every instrument.

use std::collections::BTreeMap;

use yieldline_core::{CashFlow, Date};

use crate::cashflows::{CashFlowSchedule, FlowFilter};
use crate::conventions::{ConventionResolver, ResolvedConventions, ValuationOverrides};
use crate::error::{BondError, BondResult};
use crate::types::{InstrumentTerms, ValuationRequest, ValuationState};

/// Common interface of fixed-income instruments.
///
/// Implementors expose their terms, schedule, valuation state and default
/// conventions, plus accrued interest. Settlement and convention
/// resolution, settlement filtering, coupon date lookups and clean/dirty
/// conversion are provided.
pub trait FixedIncome {
    /// Contractual terms.
    fn terms(&self) -> &InstrumentTerms;

    /// Contractual payments.
    fn schedule(&self) -> &CashFlowSchedule;

    /// Current valuation state.
    fn state(&self) -> &ValuationState;

    /// Mutable valuation state.
    fn state_mut(&mut self) -> &mut ValuationState;

    /// Default conventions and the family rules they obey.
    fn conventions(&self) -> &ConventionResolver;

    /// Accrued interest at an already resolved settlement date.
    fn accrued_interest_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64>;

    /// Issue date.
    fn issue_date(&self) -> Date {
        self.terms().issue_date
    }

    /// Maturity date.
    fn maturity(&self) -> Date {
        self.terms().maturity
    }

    /// Notional.
    fn notional(&self) -> f64 {
        self.terms().notional
    }

    /// Stored settlement date.
    fn settlement_date(&self) -> Option<Date> {
        self.state().settlement()
    }

    /// Stored price.
    fn price(&self) -> Option<f64> {
        self.state().price()
    }

    /// Stored yield to maturity.
    fn yield_to_maturity_cached(&self) -> Option<f64> {
        self.state().yield_to_maturity()
    }

    /// Explicit settlement, else the stored one, else the issue date.
    ///
    /// # Errors
    ///
    /// Returns `BondError::SettlementBeforeIssue` for an explicit date
    /// before issue.
    fn resolve_settlement_date(&self, settlement: Option<Date>) -> BondResult<Date> {
        match settlement {
            Some(date) => self.terms().check_settlement(date),
            None => Ok(self.settlement_date().unwrap_or(self.issue_date())),
        }
    }

    /// Merges per-call overrides into the default conventions.
    fn resolve_conventions(&self, overrides: &ValuationOverrides) -> BondResult<ResolvedConventions> {
        self.conventions().resolve(overrides)
    }

    /// Settlement filter under `conventions`.
    fn flow_filter(&self, conventions: &ResolvedConventions) -> FlowFilter {
        FlowFilter {
            maturity: self.maturity(),
            record_date_t_minus: self.terms().record_date_t_minus,
            adjust_to_business_days: conventions.adjust_to_business_days,
        }
    }

    /// Payments a buyer settling per `request` receives, with the request
    /// price (if any) as a negative flow on settlement.
    ///
    /// # Errors
    ///
    /// Fails for a negative price or an invalid settlement or convention.
    fn filter_payment_flow(&self, request: &ValuationRequest) -> BondResult<BTreeMap<Date, f64>> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        let price = request.price.map(BondError::check_price).transpose()?;
        Ok(self
            .flow_filter(&conventions)
            .apply(self.schedule().payments(), settlement, price))
    }

    /// Remaining payments at settlement, without a price.
    fn cash_flows(&self, settlement: Option<Date>) -> BondResult<Vec<CashFlow>> {
        let flows = self.filter_payment_flow(&ValuationRequest {
            settlement,
            ..ValuationRequest::default()
        })?;
        Ok(flows
            .into_iter()
            .map(|(date, amount)| CashFlow::new(date, amount))
            .collect())
    }

    /// First coupon date the buyer settling on `settlement` receives.
    fn next_coupon_date(&self, settlement: Date) -> Option<Date> {
        self.schedule()
            .next_coupon_date(settlement, self.terms().record_lag())
    }

    /// Coupon date preceding [`FixedIncome::next_coupon_date`].
    fn previous_coupon_date(&self, settlement: Date) -> Option<Date> {
        self.schedule()
            .previous_coupon_date(settlement, self.terms().record_lag())
    }

    /// Accrued interest at the request settlement date.
    fn accrued_interest(&self, request: &ValuationRequest) -> BondResult<f64> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        self.accrued_interest_at(settlement, &conventions)
    }

    /// Clean price from a dirty price.
    fn clean_price(&self, dirty_price: f64, request: &ValuationRequest) -> BondResult<f64> {
        Ok(dirty_price - self.accrued_interest(request)?)
    }

    /// Dirty price from a clean price.
    fn dirty_price(&self, clean_price: f64, request: &ValuationRequest) -> BondResult<f64> {
        Ok(clean_price + self.accrued_interest(request)?)
    }

    /// Stores a settlement date and drops any quote.
    fn reset_settlement_date(&mut self, settlement: Option<Date>) -> BondResult<()> {
        if let Some(date) = settlement {
            self.terms().check_settlement(date)?;
        }
        *self.state_mut() = ValuationState::settled(settlement);
        Ok(())
    }
}
