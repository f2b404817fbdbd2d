//! Yield-quoted instruments: price/yield resolution, risk and spreads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use yieldline_core::rounding::round_to;
use yieldline_core::Date;
use yieldline_curves::YieldCurve;

use crate::cashflows::CashFlowTable;
use crate::conventions::{ResolvedConventions, ValuationOverrides};
use crate::error::{BondError, BondResult};
use crate::pricing::solve_curve_spread;
use crate::risk::{self, AnalyticRisk, BumpSizes, SensitivitySums, REPORTED_DECIMALS};
use crate::traits::FixedIncome;
use crate::types::{QuoteSource, ValuationRequest, ValuationState};

/// Settlement, conventions, yield and price a valuation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedValuation {
    /// Settlement date.
    pub settlement: Date,
    /// Conventions in force.
    pub conventions: ResolvedConventions,
    /// Yield to maturity in `conventions.yield_convention`.
    pub ytm: f64,
    /// Dirty price.
    pub price: f64,
}

/// Present value of an instrument's flows on a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveValuation {
    /// Sum of the present values, the price (if any) included.
    pub value: f64,
    /// Present value of each dated flow.
    pub present_values: BTreeMap<Date, f64>,
}

/// An instrument valued through a yield to maturity.
///
/// Implementors describe how their flows are timed from a settlement date
/// and how a timing prices at a yield, solves for a yield and weighs into
/// duration and convexity. Everything else is provided:
///
/// - the four-way price/yield resolution and the state setters
/// - analytic and effective duration and convexity, DV01
/// - G-, I- and Z-spreads and curve valuation
/// - the cash-flow table
pub trait YieldInstrument: FixedIncome {
    /// Flows positioned in time from a settlement date.
    type Timing;

    /// Times the remaining flows from `settlement`, with `price` injected
    /// as a negative flow at time zero when given.
    fn calculate_time_to_payments(
        &self,
        settlement: Date,
        price: Option<f64>,
        conventions: &ResolvedConventions,
    ) -> BondResult<Self::Timing>;

    /// Price of a timing (without price) at `ytm`.
    fn price_from_timing(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64>;

    /// Yield of a timing that includes the price.
    fn yield_from_timing(
        &self,
        timing: &Self::Timing,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64>;

    /// PV-weighted sums of a timing (without price) at `ytm`.
    fn sensitivity_sums(
        &self,
        timing: &Self::Timing,
        ytm: f64,
        conventions: &ResolvedConventions,
    ) -> BondResult<SensitivitySums>;

    /// Bump sizes of the effective measures.
    fn bump_sizes(&self) -> BumpSizes {
        BumpSizes::default()
    }

    /// Timed flows for a request, with the request price if any.
    fn time_to_payments(&self, request: &ValuationRequest) -> BondResult<Self::Timing> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        let price = request.price.map(BondError::check_price).transpose()?;
        self.calculate_time_to_payments(settlement, price, &conventions)
    }

    /// Price at `ytm` on an already resolved settlement date.
    fn price_from_yield_at(
        &self,
        ytm: f64,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let timing = self.calculate_time_to_payments(settlement, None, conventions)?;
        self.price_from_timing(&timing, ytm, conventions)
    }

    /// Yield at `price` on an already resolved settlement date.
    fn yield_to_maturity_at(
        &self,
        price: f64,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        let price = BondError::check_price(price)?;
        let timing = self.calculate_time_to_payments(settlement, Some(price), conventions)?;
        self.yield_from_timing(&timing, conventions)
    }

    /// Dirty price at `ytm`.
    fn price_from_yield(&self, ytm: f64, request: &ValuationRequest) -> BondResult<f64> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        self.price_from_yield_at(ytm, settlement, &conventions)
    }

    /// Yield to maturity at the request price, or at the stored quote when
    /// the request has no price.
    fn yield_to_maturity(&self, request: &ValuationRequest) -> BondResult<f64> {
        let request = ValuationRequest {
            yield_to_maturity: None,
            ..*request
        };
        Ok(self.resolve_valuation(&request)?.ytm)
    }

    /// Resolves a yield and price pair at `settlement`.
    ///
    /// 1. Price only: the yield is solved.
    /// 2. Both: the yield is repriced and must match within `1e-5` relative.
    /// 3. Yield only: the price is computed.
    /// 4. Neither: the stored quote is reused if it was made on the same
    ///    date. Under non-default conventions the yield is re-solved from the
    ///    stored price.
    ///
    /// `None` means the instrument cannot be valued.
    fn resolve_ytm_and_price(
        &self,
        ytm: Option<f64>,
        price: Option<f64>,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<Option<(f64, f64)>> {
        match (ytm, price) {
            (None, Some(price)) => {
                let ytm = self.yield_to_maturity_at(price, settlement, conventions)?;
                Ok(Some((ytm, price)))
            }
            (Some(ytm), Some(price)) => {
                let price = BondError::check_price(price)?;
                let computed = self.price_from_yield_at(ytm, settlement, conventions)?;
                BondError::check_price_match(price, computed)?;
                Ok(Some((ytm, price)))
            }
            (Some(ytm), None) => {
                let price = self.price_from_yield_at(ytm, settlement, conventions)?;
                Ok(Some((ytm, price)))
            }
            (None, None) => {
                let Some((ytm, price)) = self.state().quote_at(settlement) else {
                    return Ok(None);
                };
                if self.conventions().is_default(conventions) {
                    return Ok(Some((ytm, price)));
                }
                let ytm = self.yield_to_maturity_at(price, settlement, conventions)?;
                Ok(Some((ytm, price)))
            }
        }
    }

    /// Resolves everything a measure needs from a request.
    ///
    /// # Errors
    ///
    /// Returns `BondError::UnresolvedValuation` when neither the request
    /// nor the stored state provides a quote.
    fn resolve_valuation(&self, request: &ValuationRequest) -> BondResult<ResolvedValuation> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        let (ytm, price) = self
            .resolve_ytm_and_price(
                request.yield_to_maturity,
                request.price,
                settlement,
                &conventions,
            )?
            .ok_or(BondError::UnresolvedValuation)?;
        Ok(ResolvedValuation {
            settlement,
            conventions,
            ytm,
            price,
        })
    }

    /// Sets the settlement date.
    ///
    /// With `reset_yield` the quote is dropped. Otherwise a stored yield is
    /// kept and the price is recomputed at the new date.
    fn set_settlement_date(&mut self, settlement: Option<Date>, reset_yield: bool) -> BondResult<()> {
        let kept_yield = if reset_yield {
            None
        } else {
            self.yield_to_maturity_cached()
        };
        self.reset_settlement_date(settlement)?;
        match (settlement, kept_yield) {
            (Some(date), Some(ytm)) => self.store_yield(ytm, date, &ValuationOverrides::default()),
            _ => Ok(()),
        }
    }

    /// Sets the yield to maturity and derives the price.
    ///
    /// A given settlement date is stored first, dropping any quote. The
    /// yield is read in the `overrides` conventions and stored in the
    /// defaults. `None` drops the quote.
    ///
    /// # Errors
    ///
    /// Returns `BondError::SettlementDateRequired` if no settlement date is
    /// known.
    fn set_yield_to_maturity(
        &mut self,
        ytm: Option<f64>,
        settlement: Option<Date>,
        overrides: &ValuationOverrides,
    ) -> BondResult<()> {
        if settlement.is_some() {
            self.reset_settlement_date(settlement)?;
        }
        let Some(date) = self.settlement_date() else {
            return match ytm {
                Some(_) => Err(BondError::SettlementDateRequired),
                None => Ok(()),
            };
        };
        match ytm {
            Some(ytm) => self.store_yield(ytm, date, overrides),
            None => self.reset_settlement_date(Some(date)),
        }
    }

    /// Sets the dirty price and derives the yield in the default
    /// conventions.
    ///
    /// # Errors
    ///
    /// Returns `BondError::SettlementDateRequired` if no settlement date is
    /// known and `BondError::NegativePrice` for a negative price.
    fn set_price(&mut self, price: Option<f64>, settlement: Option<Date>) -> BondResult<()> {
        if settlement.is_some() {
            self.reset_settlement_date(settlement)?;
        }
        let Some(date) = self.settlement_date() else {
            return match price {
                Some(_) => Err(BondError::SettlementDateRequired),
                None => Ok(()),
            };
        };
        let Some(price) = price else {
            return self.reset_settlement_date(Some(date));
        };
        let defaults = self.conventions().defaults();
        let ytm = self.yield_to_maturity_at(price, date, &defaults)?;
        *self.state_mut() = ValuationState::Quoted {
            settlement: date,
            price,
            ytm,
            source: QuoteSource::Price,
        };
        Ok(())
    }

    /// Prices `ytm` in `overrides` and stores the quote in the default
    /// conventions.
    #[doc(hidden)]
    fn store_yield(&mut self, ytm: f64, settlement: Date, overrides: &ValuationOverrides) -> BondResult<()> {
        let conventions = self.resolve_conventions(overrides)?;
        let price = self.price_from_yield_at(ytm, settlement, &conventions)?;
        let ytm = if self.conventions().is_default(&conventions) {
            ytm
        } else {
            self.yield_to_maturity_at(price, settlement, &self.conventions().defaults())?
        };
        *self.state_mut() = ValuationState::Quoted {
            settlement,
            price,
            ytm,
            source: QuoteSource::Yield,
        };
        Ok(())
    }

    /// Applies the quote a builder was given.
    ///
    /// A yield and a price given together must agree; both are then stored
    /// as given. A quote without a settlement date is an error.
    fn apply_initial_quote(
        &mut self,
        settlement: Option<Date>,
        ytm: Option<f64>,
        price: Option<f64>,
    ) -> BondResult<()> {
        let Some(date) = settlement else {
            if ytm.is_some() || price.is_some() {
                return Err(BondError::SettlementDateRequired);
            }
            return Ok(());
        };
        match (ytm, price) {
            (Some(ytm), Some(price)) => {
                self.reset_settlement_date(Some(date))?;
                let defaults = self.conventions().defaults();
                let price = BondError::check_price(price)?;
                let computed = self.price_from_yield_at(ytm, date, &defaults)?;
                BondError::check_price_match(price, computed)?;
                *self.state_mut() = ValuationState::Quoted {
                    settlement: date,
                    price,
                    ytm,
                    source: QuoteSource::Price,
                };
                Ok(())
            }
            (Some(ytm), None) => {
                self.set_yield_to_maturity(Some(ytm), Some(date), &ValuationOverrides::default())
            }
            (None, price) => self.set_price(price, Some(date)),
        }
    }

    /// Modified duration, Macaulay duration and convexity.
    fn analytic_risk(&self, request: &ValuationRequest) -> BondResult<AnalyticRisk> {
        let valuation = self.resolve_valuation(request)?;
        let timing =
            self.calculate_time_to_payments(valuation.settlement, None, &valuation.conventions)?;
        let sums = self.sensitivity_sums(&timing, valuation.ytm, &valuation.conventions)?;
        Ok(sums.per_price(valuation.price))
    }

    /// Modified duration.
    fn modified_duration(&self, request: &ValuationRequest) -> BondResult<f64> {
        Ok(self.analytic_risk(request)?.modified_duration)
    }

    /// Macaulay duration in years.
    fn macaulay_duration(&self, request: &ValuationRequest) -> BondResult<f64> {
        Ok(self.analytic_risk(request)?.macaulay_duration)
    }

    /// Convexity.
    fn convexity(&self, request: &ValuationRequest) -> BondResult<f64> {
        Ok(self.analytic_risk(request)?.convexity)
    }

    /// Duration from repricing at yields bumped both ways.
    fn effective_duration(&self, request: &ValuationRequest) -> BondResult<f64> {
        let v = self.resolve_valuation(request)?;
        let price_at = |ytm: f64| self.price_from_yield_at(ytm, v.settlement, &v.conventions);
        risk::effective_duration(price_at, v.ytm, v.price, self.bump_sizes().duration)
    }

    /// Convexity from repricing at yields bumped both ways.
    fn effective_convexity(&self, request: &ValuationRequest) -> BondResult<f64> {
        let v = self.resolve_valuation(request)?;
        let price_at = |ytm: f64| self.price_from_yield_at(ytm, v.settlement, &v.conventions);
        risk::effective_convexity(price_at, v.ytm, v.price, self.bump_sizes().convexity)
    }

    /// Sensitivity to the spread component of the yield. Equal to the
    /// effective duration for fixed-rate instruments.
    fn spread_effective_duration(&self, request: &ValuationRequest) -> BondResult<f64> {
        self.effective_duration(request)
    }

    /// Price change for a one basis point move in yield.
    fn dv01(&self, request: &ValuationRequest) -> BondResult<f64> {
        let v = self.resolve_valuation(request)?;
        let price_at = |ytm: f64| self.price_from_yield_at(ytm, v.settlement, &v.conventions);
        risk::dv01(price_at, v.ytm, self.bump_sizes().dv01)
    }

    /// Yield over a benchmark yield, or over the curve rate at maturity.
    ///
    /// # Errors
    ///
    /// Returns `BondError::MissingBenchmark` when neither is given.
    fn g_spread(
        &self,
        benchmark_ytm: Option<f64>,
        benchmark_curve: Option<&dyn YieldCurve>,
        request: &ValuationRequest,
    ) -> BondResult<f64> {
        if benchmark_ytm.is_none() && benchmark_curve.is_none() {
            return Err(BondError::MissingBenchmark);
        }
        let v = self.resolve_valuation(request)?;
        let benchmark = match (benchmark_ytm, benchmark_curve) {
            (Some(ytm), _) => ytm,
            (None, Some(curve)) => {
                curve.date_rate(self.maturity(), v.conventions.yield_convention, 0.0)?
            }
            (None, None) => return Err(BondError::MissingBenchmark),
        };
        Ok(round_to(v.ytm - benchmark, REPORTED_DECIMALS))
    }

    /// Yield over the curve rate at maturity.
    fn i_spread(&self, curve: &dyn YieldCurve, request: &ValuationRequest) -> BondResult<f64> {
        let v = self.resolve_valuation(request)?;
        let benchmark = curve.date_rate(self.maturity(), v.conventions.yield_convention, 0.0)?;
        Ok(v.ytm - benchmark)
    }

    /// Parallel spread over `curve` that discounts the flows to the price.
    fn z_spread(&self, curve: &dyn YieldCurve, request: &ValuationRequest) -> BondResult<f64> {
        let v = self.resolve_valuation(request)?;
        let flows = self.filter_payment_flow(&ValuationRequest {
            settlement: Some(v.settlement),
            overrides: request.overrides,
            ..ValuationRequest::default()
        })?;
        solve_curve_spread(0.0, |z| {
            let pv = present_value(curve, &flows, z)?;
            Ok(pv - v.price)
        })
    }

    /// Present value of the filtered flows on `curve` shifted by `spread`.
    ///
    /// The request price, when given, is included as a negative flow, so a
    /// fairly priced instrument values at zero.
    fn value_with_curve(
        &self,
        curve: &dyn YieldCurve,
        spread: f64,
        request: &ValuationRequest,
    ) -> BondResult<CurveValuation> {
        let flows = self.filter_payment_flow(request)?;
        let present_values = flows
            .iter()
            .map(|(&date, &amount)| -> BondResult<(Date, f64)> {
                Ok((date, curve.discount_date(date, spread)? * amount))
            })
            .collect::<BondResult<BTreeMap<Date, f64>>>()?;
        Ok(CurveValuation {
            value: present_values.values().sum(),
            present_values,
        })
    }

    /// Flows, coupons and amortization by date.
    ///
    /// The price appears on the settlement row only when the request
    /// carries a yield or a price.
    fn to_cash_flow_table(&self, request: &ValuationRequest) -> BondResult<CashFlowTable> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        let price = if request.yield_to_maturity.is_some() || request.price.is_some() {
            Some(self.resolve_valuation(request)?.price)
        } else {
            None
        };

        let filter = self.flow_filter(&conventions);
        let schedule = self.schedule();
        Ok(CashFlowTable::from_components(
            &filter.apply(schedule.payments(), settlement, price),
            &filter.apply(schedule.coupons(), settlement, None),
            &filter.apply(schedule.amortization(), settlement, None),
        ))
    }
}

/// `Σ D(d, spread)·cf` over dated flows.
pub(crate) fn present_value(
    curve: &dyn YieldCurve,
    flows: &BTreeMap<Date, f64>,
    spread: f64,
) -> BondResult<f64> {
    flows.iter().try_fold(0.0, |acc, (&date, &amount)| -> BondResult<f64> {
        Ok(acc + curve.discount_date(date, spread)? * amount)
    })
}
