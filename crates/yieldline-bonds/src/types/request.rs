//! Per-call valuation inputs.

use yieldline_core::{Date, YieldConvention};

use crate::conventions::ValuationOverrides;

/// Inputs of a single valuation call.
///
/// Every field is optional. A missing settlement falls back to the stored
/// one and then to the issue date; a missing price and yield fall back to
/// the stored quote when it was taken at the same settlement date.
///
/// # Example
///
/// ```rust
/// use yieldline_bonds::types::ValuationRequest;
/// use yieldline_core::{Date, YieldConvention};
///
/// let request = ValuationRequest::at(Date::from_ymd(2022, 1, 3).unwrap())
///     .with_price(98.5)
///     .with_yield_convention(YieldConvention::Annual);
/// assert_eq!(request.price, Some(98.5));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValuationRequest {
    /// Settlement date of the valuation.
    pub settlement: Option<Date>,
    /// Yield to maturity (discount margin in bps for floating-rate notes).
    pub yield_to_maturity: Option<f64>,
    /// Price at settlement.
    pub price: Option<f64>,
    /// Convention overrides for this call.
    pub overrides: ValuationOverrides,
}

impl ValuationRequest {
    /// An empty request that uses everything stored on the instrument.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A request at an explicit settlement date.
    #[must_use]
    pub fn at(settlement: Date) -> Self {
        Self::new().with_settlement(settlement)
    }

    /// Sets the settlement date.
    #[must_use]
    pub fn with_settlement(mut self, settlement: Date) -> Self {
        self.settlement = Some(settlement);
        self
    }

    /// Sets the yield to maturity.
    #[must_use]
    pub fn with_yield(mut self, yield_to_maturity: f64) -> Self {
        self.yield_to_maturity = Some(yield_to_maturity);
        self
    }

    /// Sets the price.
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Replaces the convention overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ValuationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Overrides the yield convention only.
    #[must_use]
    pub fn with_yield_convention(mut self, yield_convention: YieldConvention) -> Self {
        self.overrides = self.overrides.with_yield_convention(yield_convention);
        self
    }

    /// The same request without a quote.
    #[must_use]
    pub fn without_quote(self) -> Self {
        Self {
            yield_to_maturity: None,
            price: None,
            ..self
        }
    }
}
