//! Sequential bootstrapping of zero curves from priced instruments.
//!
//! Instruments are processed in maturity order. Each one contributes one
//! curve point, solved with only the points before it visible:
//!
//! 1. A two-flow instrument (price and a single redemption) has a closed
//!    form zero rate.
//! 2. Otherwise, flows up to the last solved maturity are discounted on the
//!    curve built so far. The remaining flows share one unknown value stored
//!    at the new maturity, with intermediate flows interpolated linearly
//!    between the last solved point and the unknown one. The unknown is found
//!    with Newton-Raphson from a cash-weighted yield guess.
//!
//! Solved points are appended to a [`SolvedPoints`] arena and never revised.

use std::cell::RefCell;
use std::iter;

use tracing::debug;
use yieldline_core::rates::convert_yield;
use yieldline_core::{DayCountConvention, Date, YieldConvention};
use yieldline_math::error::MathError;
use yieldline_math::interpolation::{Interpolator, LinearInterpolator};
use yieldline_math::solvers::{hybrid_numerical, newton_raphson_numerical, SolverConfig};

use crate::curve::{annual_discount, YieldCurve};
use crate::error::{CurveError, CurveResult};
use crate::snapshot::CurveSnapshot;
use crate::zero_coupon::ZeroCouponCurve;

/// A priced instrument that can calibrate a curve.
///
/// Both flow views include the price as a negative flow at settlement
/// (time zero).
pub trait BootstrapInstrument {
    /// Error type of the implementing instrument.
    type Error: From<CurveError>;

    /// Contractual maturity.
    fn maturity(&self) -> Date;

    /// Settlement date the quote applies to.
    fn settlement_date(&self) -> Option<Date>;

    /// Quoted dirty price, if any.
    fn price(&self) -> Option<f64>;

    /// `(time in years, amount)` flows from settlement, price included.
    fn time_to_payments(&self) -> Result<Vec<(f64, f64)>, Self::Error>;

    /// `(payment date, amount)` flows, price included at settlement.
    fn dated_flows(&self) -> Result<Vec<(Date, f64)>, Self::Error>;

    /// Yield to maturity implied by the price, used as a starting point.
    fn yield_guess(&self) -> Result<f64, Self::Error>;

    /// Effective duration, used to place the yield guess on the maturity axis.
    fn duration_guess(&self) -> Result<f64, Self::Error>;
}

/// Append-only list of solved `(maturity, value)` points.
///
/// Values between points are linear, values outside are flat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedPoints {
    points: Vec<(f64, f64)>,
}

impl SolvedPoints {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point beyond the last one.
    pub fn push(&mut self, maturity: f64, value: f64) -> CurveResult<()> {
        if let Some(last) = self.last_maturity() {
            if maturity <= last {
                return Err(CurveError::bootstrap_failed(
                    maturity,
                    format!("maturity is not after the last solved point {last:.4}"),
                ));
            }
        }
        self.points.push((maturity, value));
        Ok(())
    }

    /// Maturity of the last solved point.
    #[must_use]
    pub fn last_maturity(&self) -> Option<f64> {
        self.points.last().map(|&(t, _)| t)
    }

    /// Solved points in maturity order.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Number of solved points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing has been solved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interpolated value at `t`, optionally with a trial point appended.
    pub fn value_at(&self, t: f64, trial: Option<(f64, f64)>) -> CurveResult<f64> {
        let nodes: Vec<(f64, f64)> = self.points.iter().copied().chain(trial).collect();
        let interpolator = LinearInterpolator::from_points(&nodes)?;
        Ok(interpolator.interpolate(t)?)
    }
}

impl From<SolvedPoints> for Vec<(f64, f64)> {
    fn from(solved: SolvedPoints) -> Self {
        solved.points
    }
}

/// Yield guess from cash-weighted average times.
///
/// `(Σpos / −Σneg)^(1 / (T̄pos − T̄neg)) − 1`, where `T̄` is the cash-weighted
/// time of the positive or negative flows.
pub(crate) fn cash_weighted_guess(flows: &[(f64, f64)]) -> Option<f64> {
    let (mut pos, mut pos_t, mut neg, mut neg_t) = (0.0, 0.0, 0.0, 0.0);
    for &(t, cf) in flows {
        if cf > 0.0 {
            pos += cf;
            pos_t += cf * t;
        } else if cf < 0.0 {
            neg += cf;
            neg_t += cf * t;
        }
    }
    if pos <= 0.0 || neg >= 0.0 {
        return None;
    }
    let span = pos_t / pos - neg_t / neg;
    if span <= 0.0 {
        return None;
    }
    let guess = (pos / -neg).powf(1.0 / span) - 1.0;
    guess.is_finite().then_some(guess)
}

/// Root of a fallible objective, Newton first with a bracketed fallback.
pub(crate) fn solve_root<F>(maturity: f64, guess: f64, objective: F) -> CurveResult<f64>
where
    F: Fn(f64) -> CurveResult<f64>,
{
    let failure = RefCell::new(None);
    let f = |x: f64| match objective(x) {
        Ok(value) => value,
        Err(err) => {
            failure.borrow_mut().get_or_insert(err);
            f64::NAN
        }
    };

    let config = SolverConfig::default();
    let result = match newton_raphson_numerical(&f, guess, &config) {
        Err(MathError::FlatDerivative { .. }) => {
            debug!(maturity, guess, "flat objective, retrying with bracketed solver");
            hybrid_numerical(&f, guess, None, &config)
        }
        other => other,
    };

    match result {
        Ok(solution) => Ok(solution.root),
        Err(err) => Err(failure.into_inner().unwrap_or_else(|| {
            CurveError::bootstrap_failed(maturity, err.to_string())
        })),
    }
}

/// Solves one coupon-branch bootstrap step.
///
/// `discount(i, trial)` is the discount factor of flow `i` given the solved
/// points plus, when present, the trial value at `maturity`. Flows at or
/// before `last_solved` (and the price at time zero) form the known part.
pub(crate) fn solve_step<D>(
    maturity: f64,
    flows: &[(f64, f64)],
    last_solved: Option<f64>,
    fallback_guess: f64,
    guess_offset: f64,
    discount: D,
) -> CurveResult<f64>
where
    D: Fn(usize, Option<f64>) -> CurveResult<f64>,
{
    let mut known_pv = 0.0;
    let mut unknown = Vec::new();
    for (i, &(t, cf)) in flows.iter().enumerate() {
        if t <= 0.0 || last_solved.is_some_and(|last| t <= last) {
            known_pv += cf * discount(i, None)?;
        } else {
            unknown.push(i);
        }
    }
    if unknown.is_empty() {
        return Err(CurveError::bootstrap_failed(
            maturity,
            "no flows beyond the last solved maturity",
        ));
    }

    let guess_flows: Vec<(f64, f64)> = iter::once((0.0, known_pv))
        .chain(unknown.iter().map(|&i| flows[i]))
        .collect();
    let guess = cash_weighted_guess(&guess_flows).unwrap_or(fallback_guess) - guess_offset;

    solve_root(maturity, guess, |x| {
        unknown.iter().try_fold(known_pv, |total, &i| {
            Ok(total + flows[i].1 * discount(i, Some(x))?)
        })
    })
}

/// Checks that an instrument is priced and settles on the curve date.
pub(crate) fn check_instrument<I: BootstrapInstrument>(
    instrument: &I,
    curve_date: Date,
) -> CurveResult<f64> {
    if instrument.settlement_date() != Some(curve_date) {
        return Err(CurveError::SettlementMismatch {
            curve_date,
            settlement: instrument.settlement_date(),
        });
    }
    instrument.price().ok_or(CurveError::MissingPrice {
        maturity: instrument.maturity(),
    })
}

/// Closed-form annual zero rate of a two-flow instrument.
pub(crate) fn two_flow_annual_rate(flows: &[(f64, f64)], price: f64) -> CurveResult<f64> {
    let &(maturity, face) = flows
        .iter()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .ok_or_else(|| CurveError::invalid_input("instrument has no flows"))?;
    if maturity <= 0.0 || price <= 0.0 {
        return Err(CurveError::bootstrap_failed(
            maturity,
            "two-flow instrument needs a positive price and maturity",
        ));
    }
    Ok((face / price).powf(1.0 / maturity) - 1.0)
}

/// Zero curve bootstrapped from priced instruments.
///
/// Each instrument must settle on the curve date. Rates are stored in the
/// curve's yield convention.
///
/// # Example
///
/// ```rust
/// use yieldline_core::Date;
/// use yieldline_curves::{SpotCurve, YieldCurve};
///
/// let curve = SpotCurve::from_zero_rates(
///     Date::from_ymd(2025, 1, 1).unwrap(),
///     vec![(1.0, 0.04), (2.0, 0.045)],
/// )
/// .unwrap();
/// assert!((curve.zero_rate(1.0).unwrap() - 0.04).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SpotCurve {
    curve: ZeroCouponCurve,
}

impl SpotCurve {
    /// Bootstraps an Annual, actual/365 curve from instruments.
    pub fn bootstrap<I: BootstrapInstrument>(
        curve_date: Date,
        instruments: &[I],
    ) -> Result<Self, I::Error> {
        Self::bootstrap_with(curve_date, instruments, YieldConvention::Annual)
    }

    /// Bootstraps a curve quoted in `yield_convention`.
    pub fn bootstrap_with<I: BootstrapInstrument>(
        curve_date: Date,
        instruments: &[I],
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
            let flows = instrument.time_to_payments()?;
            let maturity = flows.iter().map(|&(t, _)| t).fold(0.0, f64::max);

            let rate = if flows.len() == 2 {
                let annual = two_flow_annual_rate(&flows, price)?;
                convert_yield(annual, YieldConvention::Annual, yield_convention)
                    .map_err(CurveError::from)?
            } else {
                let guess = instrument.yield_guess()?;
                let discount = |i: usize, trial: Option<f64>| -> CurveResult<f64> {
                    let t = flows[i].0;
                    if t <= 0.0 {
                        return Ok(1.0);
                    }
                    let rate = solved.value_at(t, trial.map(|r| (maturity, r)))?;
                    let annual = convert_yield(rate, yield_convention, YieldConvention::Annual)?;
                    Ok(annual_discount(annual, t))
                };
                solve_step(maturity, &flows, solved.last_maturity(), guess, 0.0, discount)?
            };

            debug!(
                maturity,
                rate,
                flows = flows.len(),
                "bootstrapped zero rate"
            );
            solved.push(maturity, rate)?;
        }

        let curve = ZeroCouponCurve::new(curve_date, solved.into())?
            .with_yield_convention(yield_convention)?;
        Ok(Self { curve })
    }

    /// Builds a spot curve from known zero rates (Annual, actual/365).
    pub fn from_zero_rates(curve_date: Date, zero_rates: Vec<(f64, f64)>) -> CurveResult<Self> {
        Ok(Self {
            curve: ZeroCouponCurve::new(curve_date, zero_rates)?,
        })
    }

    /// Sets the day count used for dated lookups.
    #[must_use]
    pub fn with_day_count(self, day_count: DayCountConvention) -> Self {
        Self {
            curve: self.curve.with_day_count(day_count),
        }
    }

    /// Same curve anchored at another date.
    #[must_use]
    pub fn with_curve_date(&self, curve_date: Date) -> Self {
        Self {
            curve: self.curve.with_curve_date(curve_date),
        }
    }

    /// Interpolated zero rate at `t`.
    pub fn zero_rate(&self, t: f64) -> CurveResult<f64> {
        self.curve.zero_rate(t)
    }

    /// Solved `(maturity, rate)` points.
    #[must_use]
    pub fn zero_rates(&self) -> Vec<(f64, f64)> {
        self.curve.zero_rates()
    }

    /// The underlying zero-coupon curve.
    #[must_use]
    pub fn as_zero_curve(&self) -> &ZeroCouponCurve {
        &self.curve
    }
}

impl YieldCurve for SpotCurve {
    fn curve_date(&self) -> Date {
        self.curve.curve_date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.curve.day_count()
    }

    fn yield_convention(&self) -> YieldConvention {
        self.curve.yield_convention()
    }

    fn rate_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.rate_t(t, spread)
    }

    fn discount_t(&self, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.discount_t(t, spread)
    }

    fn discount_to_rate(&self, df: f64, t: f64, spread: f64) -> CurveResult<f64> {
        self.curve.discount_to_rate(df, t, spread)
    }

    fn snapshot(&self) -> CurveSnapshot {
        self.curve.snapshot()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::TestBond;
    use super::*;
    use approx::assert_relative_eq;

    fn curve_date() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_solved_points_are_append_only() {
        let mut solved = SolvedPoints::new();
        assert!(solved.is_empty());
        solved.push(1.0, 0.03).unwrap();
        solved.push(2.0, 0.04).unwrap();
        assert!(solved.push(1.5, 0.035).is_err());
        assert_eq!(solved.len(), 2);
        assert_eq!(solved.last_maturity(), Some(2.0));
    }

    #[test]
    fn test_solved_points_with_trial() {
        let mut solved = SolvedPoints::new();
        solved.push(1.0, 0.03).unwrap();
        assert_relative_eq!(solved.value_at(2.0, None).unwrap(), 0.03);
        assert_relative_eq!(
            solved.value_at(2.0, Some((3.0, 0.05))).unwrap(),
            0.04,
            epsilon = 1e-12
        );
        assert!(SolvedPoints::new().value_at(1.0, None).is_err());
    }

    #[test]
    fn test_cash_weighted_guess() {
        // -100 now, 110 in one year: 10%
        let guess = cash_weighted_guess(&[(0.0, -100.0), (1.0, 110.0)]).unwrap();
        assert_relative_eq!(guess, 0.10, epsilon = 1e-12);
        assert!(cash_weighted_guess(&[(1.0, 110.0)]).is_none());
    }

    #[test]
    fn test_bootstrap_recovers_zero_curve() {
        let truth = ZeroCouponCurve::new(
            curve_date(),
            vec![(1.0, 0.03), (2.0, 0.035), (3.0, 0.04), (5.0, 0.045)],
        )
        .unwrap();
        let bonds: Vec<TestBond> = [(3, 4.0), (1, 0.0), (5, 5.0), (2, 3.0)]
            .iter()
            .map(|&(years, coupon)| TestBond::priced_on(&truth, years, coupon))
            .collect();

        let spot = SpotCurve::bootstrap(curve_date(), &bonds).unwrap();

        for (t, rate) in truth.zero_rates() {
            assert_relative_eq!(spot.zero_rate(t).unwrap(), rate, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_bootstrap_first_instrument_with_coupons() {
        // No solved points yet: the price must stay in the known part
        let truth = ZeroCouponCurve::new(curve_date(), vec![(2.0, 0.04)]).unwrap();
        let bond = TestBond::priced_on(&truth, 2, 5.0);

        let spot = SpotCurve::bootstrap(curve_date(), &[bond]).unwrap();
        assert_relative_eq!(spot.zero_rate(2.0).unwrap(), 0.04, epsilon = 1e-8);
    }

    #[test]
    fn test_bootstrap_in_bey() {
        let truth = ZeroCouponCurve::new(curve_date(), vec![(1.0, 0.03), (2.0, 0.04)]).unwrap();
        let bonds = vec![
            TestBond::priced_on(&truth, 1, 0.0),
            TestBond::priced_on(&truth, 2, 4.0),
        ];
        let spot = SpotCurve::bootstrap_with(curve_date(), &bonds, YieldConvention::Bey).unwrap();

        assert_eq!(spot.yield_convention(), YieldConvention::Bey);
        let annual = spot.get_rate(2.0, YieldConvention::Annual, 0.0).unwrap();
        assert_relative_eq!(annual, 0.04, epsilon = 1e-8);
    }

    #[test]
    fn test_bootstrap_rejects_other_settlement() {
        let truth = FlatCurveFixture::curve();
        let mut bond = TestBond::priced_on(&truth, 1, 0.0);
        bond.settlement = Date::from_ymd(2025, 1, 2).unwrap();
        assert!(matches!(
            SpotCurve::bootstrap(curve_date(), &[bond]),
            Err(CurveError::SettlementMismatch { .. })
        ));
    }

    #[test]
    fn test_bootstrap_requires_price() {
        let truth = FlatCurveFixture::curve();
        let mut bond = TestBond::priced_on(&truth, 1, 0.0);
        bond.price = None;
        assert!(matches!(
            SpotCurve::bootstrap(curve_date(), &[bond]),
            Err(CurveError::MissingPrice { .. })
        ));
    }

    #[test]
    fn test_bootstrap_duplicate_maturity_fails() {
        let truth = FlatCurveFixture::curve();
        let bonds = vec![
            TestBond::priced_on(&truth, 2, 3.0),
            TestBond::priced_on(&truth, 2, 5.0),
        ];
        assert!(SpotCurve::bootstrap(curve_date(), &bonds).is_err());
    }

    struct FlatCurveFixture;

    impl FlatCurveFixture {
        fn curve() -> crate::flat::FlatCurve {
            crate::flat::FlatCurve::aer(0.04, curve_date())
        }
    }
}
