//! Floating-rate notes.
//!
//! A note pays the reference rate plus a quoted margin each period. The
//! current coupon is fixed by the current reference rate; later coupons
//! are projected from forwards on a reference curve dated on settlement.
//! Notes are quoted by their discount margin (in basis points) over that
//! curve rather than by a yield.
//!
//! Every valuation goes through one gate: a settlement date, a reference
//! curve dated on it, and a known current reference rate. The rate is
//! known when given explicitly, or can be read off the curve when
//! settlement falls on the issue date or on a coupon date.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;
use yieldline_core::rates::effective_to_nominal_periods;
use yieldline_core::rounding::round_to;
use yieldline_core::{DayCountConvention, Date, YieldConvention};
use yieldline_curves::{ForwardSpreads, YieldCurve};
use yieldline_math::solvers::SolverConfig;

use crate::cashflows::{CashFlowSchedule, CashFlowTable, ScheduleConfig};
use crate::conventions::{
    ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
};
use crate::error::{BondError, BondResult};
use crate::instruments::fixed_rate::{coupon_accrued, time_flows};
use crate::pricing::{
    coupon_yield_guess, price_from_yield_times, solve_curve_spread, yield_from_times,
};
use crate::risk::{self, AnalyticRisk, BumpSizes, SensitivitySums, REPORTED_DECIMALS};
use crate::traits::{present_value, CurveValuation, FixedIncome};
use crate::types::{InstrumentTerms, QuoteSource, ValuationRequest, ValuationState};

/// Basis points per unit.
const BPS: f64 = 1e4;

/// Starting spread of the discount margin solve for a zero quoted margin.
const DEFAULT_MARGIN_GUESS: f64 = 0.005;

/// Reference-rate inputs of one note valuation.
///
/// Unset fields fall back to what the note stores. `curve_delta` shifts
/// the reference curve in parallel for both projection and discounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceInputs<'a> {
    /// Reference curve overriding the stored one.
    pub curve: Option<&'a dyn YieldCurve>,
    /// Current reference rate (decimal) overriding the stored one.
    pub current_ref_rate: Option<f64>,
    /// Parallel shift of the reference curve.
    pub curve_delta: f64,
}

impl<'a> ReferenceInputs<'a> {
    /// Inputs that use everything stored on the note.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reference curve.
    #[must_use]
    pub fn with_curve(mut self, curve: &'a dyn YieldCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Sets the current reference rate.
    #[must_use]
    pub fn with_current_ref_rate(mut self, rate: f64) -> Self {
        self.current_ref_rate = Some(rate);
        self
    }

    /// Sets the parallel curve shift.
    #[must_use]
    pub fn with_curve_delta(mut self, delta: f64) -> Self {
        self.curve_delta = delta;
        self
    }
}

/// Reference curve and rate that passed the calculation gate.
#[derive(Debug, Clone, Copy)]
struct Reference<'a> {
    curve: &'a dyn YieldCurve,
    rate: f64,
    delta: f64,
}

impl Reference<'_> {
    fn shifted(self, bump: f64) -> Self {
        Self {
            delta: self.delta + bump,
            ..self
        }
    }
}

/// Discount margin and price of a note at a resolved settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrnValuation {
    /// Settlement date.
    pub settlement: Date,
    /// Conventions in force.
    pub conventions: ResolvedConventions,
    /// Current reference rate, explicit or inferred.
    pub current_ref_rate: f64,
    /// Discount margin in basis points.
    pub discount_margin: f64,
    /// Dirty price.
    pub price: f64,
}

/// A note paying a reference rate plus a quoted margin.
///
/// Defaults: annual coupons, notional 100, T+1 settlement, T-1 record
/// date, actual/actual (Bond) accrual, 30/360 for following coupons and
/// BEY yields. The stored quote keeps the discount margin in the yield
/// slot of [`ValuationState`].
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use yieldline_bonds::prelude::*;
/// use yieldline_core::{Date, YieldConvention};
/// use yieldline_curves::FlatCurve;
///
/// let issue = Date::from_ymd(2021, 1, 4).unwrap();
/// let curve = Rc::new(FlatCurve::aer(0.04, issue));
/// let note = FloatingRateNote::builder()
///     .issue_date(issue)
///     .maturity(Date::from_ymd(2024, 1, 4).unwrap())
///     .yield_convention(YieldConvention::Annual)
///     .ref_rate_curve(curve)
///     .build()
///     .unwrap();
///
/// let request = ValuationRequest::at(issue);
/// let price = note
///     .price_from_discount_margin(0.0, &request, &ReferenceInputs::new())
///     .unwrap();
/// assert!((price - 100.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct FloatingRateNote {
    terms: InstrumentTerms,
    schedule: CashFlowSchedule,
    conventions: ConventionResolver,
    state: ValuationState,
    quoted_margin: f64,
    current_ref_rate: Option<f64>,
    ref_rate_curve: Option<Rc<dyn YieldCurve>>,
    bumps: BumpSizes,
}

impl FloatingRateNote {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> FloatingRateNoteBuilder {
        FloatingRateNoteBuilder::default()
    }

    /// Quoted margin in basis points.
    #[must_use]
    pub fn quoted_margin(&self) -> f64 {
        self.quoted_margin * BPS
    }

    /// Stored current reference rate.
    #[must_use]
    pub fn current_ref_rate(&self) -> Option<f64> {
        self.current_ref_rate
    }

    /// Stored reference curve.
    #[must_use]
    pub fn ref_rate_curve(&self) -> Option<&Rc<dyn YieldCurve>> {
        self.ref_rate_curve.as_ref()
    }

    /// Stored discount margin in basis points.
    #[must_use]
    pub fn discount_margin_cached(&self) -> Option<f64> {
        self.state.yield_to_maturity()
    }

    /// Whether the note can be valued at `settlement` with `inputs`.
    #[must_use]
    pub fn can_calculate(&self, settlement: Option<Date>, inputs: &ReferenceInputs<'_>) -> bool {
        settlement.is_some_and(|date| self.reference(date, inputs).is_ok())
    }

    fn reference<'s>(
        &'s self,
        settlement: Date,
        inputs: &ReferenceInputs<'s>,
    ) -> BondResult<Reference<'s>> {
        let curve = inputs
            .curve
            .or(self.ref_rate_curve.as_deref())
            .ok_or(BondError::CurveRequired { settlement })?;
        if curve.curve_date() != settlement {
            return Err(BondError::CurveRequired { settlement });
        }

        let rate = match inputs.current_ref_rate.or(self.current_ref_rate) {
            Some(rate) => rate,
            None if self.terms.cpn_freq == 0 => 0.0,
            None if settlement == self.terms.issue_date
                || self.schedule.coupons().contains_key(&settlement) =>
            {
                self.infer_ref_rate(curve, settlement)?
            }
            None => return Err(BondError::ReferenceRateUnavailable { settlement }),
        };
        Ok(Reference {
            curve,
            rate,
            delta: inputs.curve_delta,
        })
    }

    /// Forward to the first coupon as an effective annual rate, restated
    /// as a nominal rate compounded at the coupon frequency.
    fn infer_ref_rate(&self, curve: &dyn YieldCurve, settlement: Date) -> BondResult<f64> {
        let Some(first) = self.next_coupon_date(settlement) else {
            return Ok(0.0);
        };
        let forward = curve.forward_dates(
            settlement,
            first,
            YieldConvention::Annual,
            ForwardSpreads::NONE,
        )?;
        let rate = effective_to_nominal_periods(forward, self.terms.cpn_freq)?;
        debug!(%settlement, %first, rate, "inferred current reference rate from the curve");
        Ok(rate)
    }

    fn setup<'s>(
        &'s self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'s>,
    ) -> BondResult<(Date, ResolvedConventions, Reference<'s>)> {
        let settlement = self.resolve_settlement_date(request.settlement)?;
        let conventions = self.resolve_conventions(&request.overrides)?;
        let reference = self.reference(settlement, inputs)?;
        Ok((settlement, conventions, reference))
    }

    /// Projected flows: spread coupon plus reference rate, amortization,
    /// and `-price` on settlement when given.
    fn expected_flows_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
        reference: &Reference<'_>,
        price: Option<f64>,
    ) -> BondResult<BTreeMap<Date, f64>> {
        let filter = self.flow_filter(conventions);
        let mut flows = BTreeMap::new();

        if self.terms.cpn_freq > 0 {
            let per_period = self.terms.notional / f64::from(self.terms.cpn_freq);
            let mut last = settlement;
            for (i, (date, spread)) in filter
                .apply(self.schedule.coupons(), settlement, None)
                .into_iter()
                .enumerate()
            {
                let rate = if i == 0 {
                    reference.rate
                } else {
                    reference.curve.forward_dates(
                        last,
                        date,
                        conventions.yield_convention,
                        ForwardSpreads::shifted(reference.delta),
                    )?
                };
                flows.insert(date, spread + rate * per_period);
                last = date;
            }
        }

        for (date, amount) in filter.apply(self.schedule.amortization(), settlement, None) {
            if amount != 0.0 {
                *flows.entry(date).or_insert(0.0) += amount;
            }
        }
        if let Some(price) = price {
            *flows.entry(settlement).or_insert(0.0) -= BondError::check_price(price)?;
        }
        Ok(flows)
    }

    fn price_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
        reference: &Reference<'_>,
        discount_margin: f64,
    ) -> BondResult<f64> {
        let flows = self.expected_flows_at(settlement, conventions, reference, None)?;
        present_value(
            reference.curve,
            &flows,
            discount_margin / BPS + reference.delta,
        )
    }

    fn margin_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
        reference: &Reference<'_>,
        price: f64,
    ) -> BondResult<f64> {
        let flows = self.expected_flows_at(settlement, conventions, reference, Some(price))?;
        let guess = if self.quoted_margin > 0.0 {
            self.quoted_margin
        } else {
            DEFAULT_MARGIN_GUESS
        };
        let spread = solve_curve_spread(guess, |z| {
            present_value(reference.curve, &flows, z + reference.delta)
        })?;
        Ok(spread * BPS)
    }

    /// Same four cases as fixed-rate resolution, with the discount margin
    /// standing in for the yield.
    fn resolve_margin_and_price(
        &self,
        discount_margin: Option<f64>,
        price: Option<f64>,
        settlement: Date,
        conventions: &ResolvedConventions,
        reference: &Reference<'_>,
    ) -> BondResult<Option<(f64, f64)>> {
        match (discount_margin, price) {
            (None, Some(price)) => {
                let dm = self.margin_at(settlement, conventions, reference, price)?;
                Ok(Some((dm, price)))
            }
            (Some(dm), Some(price)) => {
                let price = BondError::check_price(price)?;
                let computed = self.price_at(settlement, conventions, reference, dm)?;
                BondError::check_price_match(price, computed)?;
                Ok(Some((dm, price)))
            }
            (Some(dm), None) => {
                let price = self.price_at(settlement, conventions, reference, dm)?;
                Ok(Some((dm, price)))
            }
            (None, None) => {
                let Some((dm, price)) = self.state.quote_at(settlement) else {
                    return Ok(None);
                };
                if self.conventions.is_default(conventions) && reference.delta == 0.0 {
                    return Ok(Some((dm, price)));
                }
                let dm = self.margin_at(settlement, conventions, reference, price)?;
                Ok(Some((dm, price)))
            }
        }
    }

    fn resolve_with<'s>(
        &'s self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'s>,
    ) -> BondResult<(FrnValuation, Reference<'s>)> {
        let (settlement, conventions, reference) = self.setup(request, inputs)?;
        let (discount_margin, price) = self
            .resolve_margin_and_price(
                request.yield_to_maturity,
                request.price,
                settlement,
                &conventions,
                &reference,
            )?
            .ok_or(BondError::UnresolvedValuation)?;
        let valuation = FrnValuation {
            settlement,
            conventions,
            current_ref_rate: reference.rate,
            discount_margin,
            price,
        };
        Ok((valuation, reference))
    }

    /// Resolves the discount margin and price of a request. The request's
    /// `yield_to_maturity` is read as a discount margin in basis points.
    ///
    /// # Errors
    ///
    /// Fails at the calculation gate, or with
    /// `BondError::UnresolvedValuation` when there is nothing to value
    /// from.
    pub fn resolve_valuation(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<FrnValuation> {
        Ok(self.resolve_with(request, inputs)?.0)
    }

    /// Expected flows at the request settlement, with the request price as
    /// a negative flow when given.
    pub fn expected_cash_flows(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<BTreeMap<Date, f64>> {
        let (settlement, conventions, reference) = self.setup(request, inputs)?;
        self.expected_flows_at(settlement, &conventions, &reference, request.price)
    }

    /// Expected flows timed in years from settlement.
    pub fn time_to_payments(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<Vec<(f64, f64)>> {
        let (settlement, conventions, reference) = self.setup(request, inputs)?;
        let flows = self.expected_flows_at(settlement, &conventions, &reference, request.price)?;
        time_flows(self, flows, settlement, &conventions)
    }

    /// Dirty price at a discount margin in basis points.
    pub fn price_from_discount_margin(
        &self,
        discount_margin: f64,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (settlement, conventions, reference) = self.setup(request, inputs)?;
        self.price_at(settlement, &conventions, &reference, discount_margin)
    }

    /// Discount margin in basis points that reprices the expected flows.
    pub fn discount_margin(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let request = ValuationRequest {
            yield_to_maturity: None,
            ..*request
        };
        Ok(self.resolve_valuation(&request, inputs)?.discount_margin)
    }

    /// Margin over the reference curve the market requires; the discount
    /// margin under another name.
    pub fn required_margin(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        self.discount_margin(request, inputs)
    }

    /// Reference rate to the next reset plus the discount margin.
    pub fn yield_to_maturity(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        self.reset_yield(&v, &reference)
    }

    fn reset_yield(&self, v: &FrnValuation, reference: &Reference<'_>) -> BondResult<f64> {
        let reset = self
            .next_coupon_date(v.settlement)
            .unwrap_or(self.terms.maturity);
        let rate =
            reference
                .curve
                .date_rate(reset, v.conventions.yield_convention, reference.delta)?;
        Ok(rate + v.discount_margin / BPS)
    }

    /// Internal rate of return of the expected flows against the price.
    pub fn expected_yield_to_maturity(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        self.expected_yield(&v, &reference)
    }

    fn expected_yield(&self, v: &FrnValuation, reference: &Reference<'_>) -> BondResult<f64> {
        let flows = self.expected_flows_at(v.settlement, &v.conventions, reference, Some(v.price))?;
        let times = time_flows(self, flows, v.settlement, &v.conventions)?;
        let guess = coupon_yield_guess(self.quoted_margin * 100.0, v.conventions.yield_convention);
        yield_from_times(
            &times,
            guess,
            v.conventions.yield_convention,
            &SolverConfig::ytm(),
        )
    }

    /// Years from settlement to the next reset.
    fn reset_time(&self, v: &FrnValuation) -> BondResult<f64> {
        let reset = self
            .next_coupon_date(v.settlement)
            .unwrap_or(self.terms.maturity);
        let times = time_flows(self, BTreeMap::from([(reset, 1.0)]), v.settlement, &v.conventions)?;
        Ok(times.first().map_or(0.0, |&(t, _)| t))
    }

    /// Duration and convexity of a unit payment at the next reset,
    /// discounted at [`FloatingRateNote::yield_to_maturity`].
    pub fn analytic_risk(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<AnalyticRisk> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let ytm = self.reset_yield(&v, &reference)?;
        let reset = [(self.reset_time(&v)?, 1.0)];
        let convention = v.conventions.yield_convention;
        let unit_price = price_from_yield_times(&reset, ytm, convention);
        Ok(SensitivitySums::from_times(&reset, ytm, convention).per_price(unit_price))
    }

    /// Modified duration to the next reset.
    pub fn modified_duration(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        Ok(self.analytic_risk(request, inputs)?.modified_duration)
    }

    /// Macaulay duration: the time to the next reset.
    pub fn macaulay_duration(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        Ok(self.analytic_risk(request, inputs)?.macaulay_duration)
    }

    /// Convexity to the next reset.
    pub fn convexity(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        Ok(self.analytic_risk(request, inputs)?.convexity)
    }

    /// Effective duration of a unit payment at the next reset.
    pub fn effective_duration(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let ytm = self.reset_yield(&v, &reference)?;
        let reset = [(self.reset_time(&v)?, 1.0)];
        let convention = v.conventions.yield_convention;
        let price_at = |y: f64| Ok(price_from_yield_times(&reset, y, convention));
        risk::effective_duration(
            price_at,
            ytm,
            price_from_yield_times(&reset, ytm, convention),
            self.bumps.duration,
        )
    }

    /// Modified duration of the expected flows at the expected yield.
    pub fn spread_duration(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let ytm = self.expected_yield(&v, &reference)?;
        let flows = self.expected_flows_at(v.settlement, &v.conventions, &reference, None)?;
        let times = time_flows(self, flows, v.settlement, &v.conventions)?;
        let sums = SensitivitySums::from_times(&times, ytm, v.conventions.yield_convention);
        Ok(risk::per_price(sums.modified, v.price))
    }

    /// Duration to the discount margin from repricing at bumped margins.
    pub fn effective_spread_duration(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let price_at =
            |spread: f64| self.price_at(v.settlement, &v.conventions, &reference, spread * BPS);
        risk::effective_duration(
            price_at,
            v.discount_margin / BPS,
            v.price,
            self.bumps.spread_duration_bps / BPS,
        )
    }

    /// Price change for a one basis point fall in the discount margin.
    pub fn spread_dv01(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let price_at = |dm: f64| self.price_at(v.settlement, &v.conventions, &reference, dm);
        let change = risk::dv01(price_at, v.discount_margin, self.bumps.spread_dv01_bps)?;
        Ok(-change)
    }

    /// Price change for a one basis point parallel shift of the reference
    /// curve, projecting and discounting on the shifted curve.
    pub fn dv01(&self, request: &ValuationRequest, inputs: &ReferenceInputs<'_>) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let price_at = |shift: f64| {
            self.price_at(
                v.settlement,
                &v.conventions,
                &reference.shifted(shift),
                v.discount_margin,
            )
        };
        risk::dv01(price_at, 0.0, self.bumps.dv01)
    }

    /// The discount margin as a decimal spread over the reference curve.
    pub fn z_spread(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        Ok(self.resolve_valuation(request, inputs)?.discount_margin / BPS)
    }

    /// Expected yield over the curve rate at maturity.
    pub fn i_spread(
        &self,
        curve: &dyn YieldCurve,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let (v, reference) = self.resolve_with(request, inputs)?;
        let ytm = self.expected_yield(&v, &reference)?;
        let benchmark =
            curve.date_rate(self.terms.maturity, v.conventions.yield_convention, 0.0)?;
        Ok(ytm - benchmark)
    }

    /// Expected yield over a benchmark yield or the benchmark curve rate at
    /// maturity.
    ///
    /// # Errors
    ///
    /// Returns `BondError::MissingBenchmark` when neither is given.
    pub fn g_spread(
        &self,
        benchmark_ytm: Option<f64>,
        benchmark_curve: Option<&dyn YieldCurve>,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<f64> {
        let benchmark_of = |convention: YieldConvention| -> BondResult<f64> {
            match (benchmark_ytm, benchmark_curve) {
                (Some(ytm), _) => Ok(ytm),
                (None, Some(curve)) => {
                    Ok(curve.date_rate(self.terms.maturity, convention, 0.0)?)
                }
                (None, None) => Err(BondError::MissingBenchmark),
            }
        };
        if benchmark_ytm.is_none() && benchmark_curve.is_none() {
            return Err(BondError::MissingBenchmark);
        }
        let (v, reference) = self.resolve_with(request, inputs)?;
        let ytm = self.expected_yield(&v, &reference)?;
        let benchmark = benchmark_of(v.conventions.yield_convention)?;
        Ok(round_to(ytm - benchmark, REPORTED_DECIMALS))
    }

    /// Present value of the expected flows on `curve` shifted by `spread`.
    /// The request price, when given, is included as a negative flow.
    pub fn value_with_curve(
        &self,
        curve: &dyn YieldCurve,
        spread: f64,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<CurveValuation> {
        let flows = self.expected_cash_flows(request, inputs)?;
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

    /// Expected flows, projected coupons and amortization by date.
    ///
    /// The price appears on the settlement row only when the request
    /// carries a discount margin or a price.
    pub fn to_cash_flow_table(
        &self,
        request: &ValuationRequest,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<CashFlowTable> {
        let (settlement, conventions, reference) = self.setup(request, inputs)?;
        let price = if request.yield_to_maturity.is_some() || request.price.is_some() {
            Some(self.resolve_valuation(request, inputs)?.price)
        } else {
            None
        };

        let filter = self.flow_filter(&conventions);
        let amortization = filter.apply(self.schedule.amortization(), settlement, None);
        let expected = self.expected_flows_at(settlement, &conventions, &reference, None)?;
        let coupons: BTreeMap<Date, f64> = expected
            .iter()
            .map(|(&date, &amount)| {
                (date, amount - amortization.get(&date).copied().unwrap_or(0.0))
            })
            .collect();
        let flows = match price {
            Some(price) => {
                self.expected_flows_at(settlement, &conventions, &reference, Some(price))?
            }
            None => expected,
        };
        Ok(CashFlowTable::from_components(&flows, &coupons, &amortization))
    }

    /// Sets the settlement date and drops the stored quote.
    pub fn set_settlement_date(&mut self, settlement: Option<Date>) -> BondResult<()> {
        self.reset_settlement_date(settlement)
    }

    /// Quotes the note at a discount margin in basis points. `None` clears
    /// the quote.
    ///
    /// # Errors
    ///
    /// Returns `BondError::SettlementDateRequired` without a settlement
    /// date, or fails at the calculation gate.
    pub fn set_discount_margin(
        &mut self,
        discount_margin: Option<f64>,
        settlement: Option<Date>,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<()> {
        let settlement = self.quote_settlement(settlement)?;
        let Some(dm) = discount_margin else {
            return self.reset_settlement_date(Some(settlement));
        };
        let request = ValuationRequest::at(settlement).with_yield(dm);
        let price = self.resolve_valuation(&request, inputs)?.price;
        self.state = ValuationState::Quoted {
            settlement,
            price,
            ytm: dm,
            source: QuoteSource::Yield,
        };
        Ok(())
    }

    /// Quotes the note at a dirty price. `None` clears the quote.
    ///
    /// # Errors
    ///
    /// Returns `BondError::SettlementDateRequired` without a settlement
    /// date, or fails at the calculation gate.
    pub fn set_price(
        &mut self,
        price: Option<f64>,
        settlement: Option<Date>,
        inputs: &ReferenceInputs<'_>,
    ) -> BondResult<()> {
        let settlement = self.quote_settlement(settlement)?;
        let Some(price) = price else {
            return self.reset_settlement_date(Some(settlement));
        };
        let request = ValuationRequest::at(settlement).with_price(price);
        let dm = self.resolve_valuation(&request, inputs)?.discount_margin;
        self.state = ValuationState::Quoted {
            settlement,
            price,
            ytm: dm,
            source: QuoteSource::Price,
        };
        Ok(())
    }

    fn quote_settlement(&self, settlement: Option<Date>) -> BondResult<Date> {
        let settlement = settlement
            .or(self.state.settlement())
            .ok_or(BondError::SettlementDateRequired)?;
        self.terms.check_settlement(settlement)
    }
}

impl FixedIncome for FloatingRateNote {
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

    /// `(ref + qm)·notional` accrued since the previous coupon, using the
    /// stored current reference rate.
    fn accrued_interest_at(
        &self,
        settlement: Date,
        conventions: &ResolvedConventions,
    ) -> BondResult<f64> {
        if self.terms.cpn_freq == 0 {
            return Ok(0.0);
        }
        let ref_rate = self
            .current_ref_rate
            .ok_or(BondError::ReferenceRateUnavailable { settlement })?;
        coupon_accrued(self, settlement, conventions, ref_rate + self.quoted_margin)
    }
}

/// Builder for [`FloatingRateNote`].
#[derive(Debug, Clone, Default)]
pub struct FloatingRateNoteBuilder {
    issue_date: Option<Date>,
    maturity: Option<Date>,
    quoted_margin_bps: f64,
    cpn_freq: Option<u32>,
    notional: Option<f64>,
    settlement_t_plus: Option<u32>,
    record_date_t_minus: Option<u32>,
    settlement_date: Option<Date>,
    discount_margin: Option<f64>,
    price: Option<f64>,
    current_ref_rate: Option<f64>,
    ref_rate_curve: Option<Rc<dyn YieldCurve>>,
    conventions: ValuationOverrides,
    schedule_config: ScheduleConfig,
    bumps: BumpSizes,
}

impl FloatingRateNoteBuilder {
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

    /// Sets the quoted margin in basis points.
    #[must_use]
    pub fn quoted_margin(mut self, bps: f64) -> Self {
        self.quoted_margin_bps = bps;
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

    /// Quotes the note at a discount margin in basis points.
    #[must_use]
    pub fn discount_margin(mut self, bps: f64) -> Self {
        self.discount_margin = Some(bps);
        self
    }

    /// Quotes the note at a dirty price.
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the current reference rate (decimal).
    #[must_use]
    pub fn current_ref_rate(mut self, rate: f64) -> Self {
        self.current_ref_rate = Some(rate);
        self
    }

    /// Sets the shared reference curve.
    #[must_use]
    pub fn ref_rate_curve(mut self, curve: Rc<dyn YieldCurve>) -> Self {
        self.ref_rate_curve = Some(curve);
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

    /// Builds the note and applies the initial quote.
    ///
    /// # Errors
    ///
    /// Returns an error if a date is missing, the terms or conventions are
    /// invalid, or an initial quote cannot pass the calculation gate.
    pub fn build(self) -> BondResult<FloatingRateNote> {
        let terms = InstrumentTerms {
            issue_date: self
                .issue_date
                .ok_or_else(|| BondError::missing_field("issue_date"))?,
            maturity: self
                .maturity
                .ok_or_else(|| BondError::missing_field("maturity"))?,
            notional: self.notional.unwrap_or(100.0),
            cpn: self.quoted_margin_bps / 100.0,
            cpn_freq: self.cpn_freq.unwrap_or(1),
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

        let schedule = CashFlowSchedule::floating(
            terms.issue_date,
            terms.maturity,
            terms.notional,
            terms.coupon_per_period(),
            terms.cpn_freq,
            &self.schedule_config,
        )?;

        let settlement = self.settlement_date.map(|date| terms.check_settlement(date)).transpose()?;
        let mut note = FloatingRateNote {
            terms,
            schedule,
            conventions,
            state: ValuationState::settled(settlement),
            quoted_margin: self.quoted_margin_bps / BPS,
            current_ref_rate: self.current_ref_rate,
            ref_rate_curve: self.ref_rate_curve,
            bumps: self.bumps,
        };

        let Some(settlement) = settlement else {
            if self.discount_margin.is_some() || self.price.is_some() {
                return Err(BondError::SettlementDateRequired);
            }
            return Ok(note);
        };
        let inputs = ReferenceInputs::new();
        match (self.discount_margin, self.price) {
            (Some(dm), Some(price)) => {
                let request = ValuationRequest::at(settlement)
                    .with_yield(dm)
                    .with_price(price);
                note.resolve_valuation(&request, &inputs)?;
                note.state = ValuationState::Quoted {
                    settlement,
                    price,
                    ytm: dm,
                    source: QuoteSource::Price,
                };
            }
            (Some(dm), None) => note.set_discount_margin(Some(dm), Some(settlement), &inputs)?,
            (None, Some(price)) => note.set_price(Some(price), Some(settlement), &inputs)?,
            (None, None) => {}
        }
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use yieldline_curves::FlatCurve;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn issue() -> Date {
        d(2021, 1, 4)
    }

    fn note_on(curve: FlatCurve, margin_bps: f64) -> FloatingRateNote {
        FloatingRateNote::builder()
            .issue_date(issue())
            .maturity(d(2024, 1, 4))
            .quoted_margin(margin_bps)
            .yield_convention(YieldConvention::Annual)
            .ref_rate_curve(Rc::new(curve))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_and_schedule() {
        let note = FloatingRateNote::builder()
            .issue_date(issue())
            .maturity(d(2024, 1, 4))
            .quoted_margin(50.0)
            .build()
            .unwrap();
        assert_relative_eq!(note.quoted_margin(), 50.0, epsilon = 1e-12);
        assert_eq!(note.terms().cpn_freq, 1);
        assert_eq!(
            note.conventions().defaults(),
            ResolvedConventions::bond_defaults()
        );
        assert_eq!(note.schedule().coupons().len(), 3);
        for spread in note.schedule().coupons().values() {
            assert_relative_eq!(*spread, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_par_at_zero_margin() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let request = ValuationRequest::at(issue());
        let inputs = ReferenceInputs::new();

        let flows = note.expected_cash_flows(&request, &inputs).unwrap();
        let amounts: Vec<f64> = flows.values().copied().collect();
        assert_eq!(amounts.len(), 3);
        assert_relative_eq!(amounts[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(amounts[1], 4.0, epsilon = 1e-9);
        assert_relative_eq!(amounts[2], 104.0, epsilon = 1e-9);

        let price = note.price_from_discount_margin(0.0, &request, &inputs).unwrap();
        assert_relative_eq!(price, 100.0, epsilon = 1e-9);

        let ytm = note
            .expected_yield_to_maturity(&request.with_price(100.0), &inputs)
            .unwrap();
        assert_relative_eq!(ytm, 0.04, epsilon = 1e-6);
    }

    #[test]
    fn test_discount_margin_round_trip() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 25.0);
        let request = ValuationRequest::at(issue());
        let inputs = ReferenceInputs::new();

        let dm = note.discount_margin(&request.with_price(99.0), &inputs).unwrap();
        assert!(dm > 25.0);
        let price = note.price_from_discount_margin(dm, &request, &inputs).unwrap();
        assert_relative_eq!(price, 99.0, epsilon = 1e-6);

        let z = note.z_spread(&request.with_price(99.0), &inputs).unwrap();
        assert_relative_eq!(z, dm / 1e4, epsilon = 1e-12);
    }

    #[test]
    fn test_yield_is_reset_rate_plus_margin() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let request = ValuationRequest::at(issue()).with_yield(30.0);
        let ytm = note.yield_to_maturity(&request, &ReferenceInputs::new()).unwrap();
        assert_relative_eq!(ytm, 0.043, epsilon = 1e-12);
    }

    #[test]
    fn test_risk_to_next_reset() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let request = ValuationRequest::at(issue()).with_yield(0.0);
        let inputs = ReferenceInputs::new();

        let risk = note.analytic_risk(&request, &inputs).unwrap();
        assert_relative_eq!(risk.macaulay_duration, 1.0, epsilon = 1e-9);
        assert_relative_eq!(risk.modified_duration, 1.0 / 1.04, epsilon = 1e-9);
        assert_relative_eq!(risk.convexity, 2.0 / 1.04_f64.powi(2), epsilon = 1e-9);

        let effective = note.effective_duration(&request, &inputs).unwrap();
        assert_relative_eq!(effective, risk.modified_duration, epsilon = 1e-6);

        let spread_duration = note.spread_duration(&request, &inputs).unwrap();
        assert!(spread_duration > 2.5 && spread_duration < 3.0);
        let effective_spread = note.effective_spread_duration(&request, &inputs).unwrap();
        assert_relative_eq!(effective_spread, spread_duration, epsilon = 0.05);

        let spread_dv01 = note.spread_dv01(&request, &inputs).unwrap();
        assert!(spread_dv01 > 0.0);
        let dv01 = note.dv01(&request, &inputs).unwrap();
        assert!(dv01.abs() < spread_dv01);
    }

    #[test]
    fn test_curve_delta_lifts_projected_coupons() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let request = ValuationRequest::at(issue());
        let inputs = ReferenceInputs::new().with_curve_delta(0.0001);

        let amounts: Vec<f64> = note
            .expected_cash_flows(&request, &inputs)
            .unwrap()
            .into_values()
            .collect();
        assert_relative_eq!(amounts[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(amounts[1], 4.01, epsilon = 1e-9);
        assert_relative_eq!(amounts[2], 104.01, epsilon = 1e-9);

        // later coupons reprice to par at the next reset
        let price = note.price_from_discount_margin(0.0, &request, &inputs).unwrap();
        assert_relative_eq!(price, 104.0 / 1.0401, epsilon = 1e-9);

        let request = request.with_yield(0.0);
        let dv01 = note.dv01(&request, &ReferenceInputs::new()).unwrap();
        let spread_dv01 = note.spread_dv01(&request, &ReferenceInputs::new()).unwrap();
        assert!(dv01 < 0.0);
        assert_relative_eq!(dv01, -104.0 / 1.04_f64.powi(2) * 1e-4, epsilon = 1e-6);
        assert!(spread_dv01 > 2.0 * dv01.abs());
    }

    #[test]
    fn test_calculation_gate() {
        let note = FloatingRateNote::builder()
            .issue_date(issue())
            .maturity(d(2024, 1, 4))
            .build()
            .unwrap();
        let request = ValuationRequest::at(issue()).with_yield(0.0);
        assert!(matches!(
            note.price_from_discount_margin(0.0, &request, &ReferenceInputs::new()),
            Err(BondError::CurveRequired { .. })
        ));

        let stale = FlatCurve::aer(0.04, d(2020, 12, 31));
        assert!(!note.can_calculate(Some(issue()), &ReferenceInputs::new().with_curve(&stale)));

        let mid = issue().add_days(100);
        let curve = FlatCurve::aer(0.04, mid);
        let inputs = ReferenceInputs::new().with_curve(&curve);
        assert!(matches!(
            note.price_from_discount_margin(0.0, &ValuationRequest::at(mid), &inputs),
            Err(BondError::ReferenceRateUnavailable { .. })
        ));
        assert!(note.can_calculate(Some(mid), &inputs.with_current_ref_rate(0.03)));
        assert!(!note.can_calculate(None, &inputs));
    }

    #[test]
    fn test_quote_and_settlement_change() {
        let mut note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let inputs = ReferenceInputs::new();
        note.set_price(Some(99.5), Some(issue()), &inputs).unwrap();
        let dm = note.discount_margin_cached().unwrap();
        assert!(dm > 0.0);

        let v = note
            .resolve_valuation(&ValuationRequest::at(issue()), &inputs)
            .unwrap();
        assert_relative_eq!(v.discount_margin, dm, epsilon = 1e-12);
        assert_relative_eq!(v.price, 99.5, epsilon = 1e-12);

        note.set_settlement_date(Some(d(2021, 6, 1))).unwrap();
        assert_eq!(note.price(), None);
        assert_eq!(note.discount_margin_cached(), None);
    }

    #[test]
    fn test_accrued_interest() {
        let note = FloatingRateNote::builder()
            .issue_date(issue())
            .maturity(d(2024, 1, 4))
            .quoted_margin(50.0)
            .current_ref_rate(0.03)
            .yield_convention(YieldConvention::Annual)
            .build()
            .unwrap();
        let settlement = issue().add_days(182);
        let accrued = note
            .accrued_interest(&ValuationRequest::at(settlement))
            .unwrap();
        assert_relative_eq!(accrued, 0.035 * 100.0 * 182.0 / 365.0, epsilon = 1e-9);

        let unknown = note_on(FlatCurve::aer(0.04, issue()), 50.0);
        assert!(matches!(
            unknown.accrued_interest(&ValuationRequest::at(settlement)),
            Err(BondError::ReferenceRateUnavailable { .. })
        ));
    }

    #[test]
    fn test_cash_flow_table() {
        let note = note_on(FlatCurve::aer(0.04, issue()), 0.0);
        let table = note
            .to_cash_flow_table(&ValuationRequest::at(issue()).with_yield(0.0), &ReferenceInputs::new())
            .unwrap();
        let first = table.row(issue()).unwrap();
        assert_relative_eq!(first.cost, 100.0, epsilon = 1e-9);
        let last = table.row(d(2024, 1, 4)).unwrap();
        assert_relative_eq!(last.coupon, 4.0, epsilon = 1e-9);
        assert_relative_eq!(last.amortization, 100.0, epsilon = 1e-12);
        assert_relative_eq!(last.cost, 0.0, epsilon = 1e-9);
    }
}
