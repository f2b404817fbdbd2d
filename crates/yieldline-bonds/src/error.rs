//! Error types for bond operations.

use thiserror::Error;
use yieldline_core::{CoreError, Date};
use yieldline_curves::CurveError;
use yieldline_math::MathError;

/// A specialized Result type for bond operations.
pub type BondResult<T> = Result<T, BondError>;

/// Errors that can occur during bond operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BondError {
    /// Invalid bond specification.
    #[error("Invalid bond specification: {reason}")]
    InvalidSpec {
        /// Description of what's invalid.
        reason: String,
    },

    /// Missing required field.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// A convention the instrument family does not accept.
    #[error("{kind} convention '{name}' is not supported for {family}. Supported: {supported}")]
    UnsupportedConvention {
        /// Which family of convention was rejected.
        kind: &'static str,
        /// Name of the rejected convention.
        name: &'static str,
        /// Instrument family doing the rejecting.
        family: &'static str,
        /// Comma separated list of accepted names.
        supported: String,
    },

    /// Prices must be non-negative.
    #[error("Price must be non-negative, got {price}")]
    NegativePrice {
        /// The offending price.
        price: f64,
    },

    /// A price and a yield were both given and disagree.
    #[error(
        "Price calculated by yield to maturity ({computed}) does not match the given price ({given})."
    )]
    PriceMismatch {
        /// Price supplied by the caller.
        given: f64,
        /// Price implied by the supplied yield.
        computed: f64,
    },

    /// A custom amortization schedule that does not repay the notional.
    #[error("Amortization schedule sums to {amortization}, notional is {notional}")]
    AmortizationMismatch {
        /// Notional of the instrument.
        notional: f64,
        /// Sum of the amortization schedule.
        amortization: f64,
    },

    /// A settlement date before the issue date.
    #[error("Settlement date {settlement} is before issue date {issue}")]
    SettlementBeforeIssue {
        /// Requested settlement date.
        settlement: Date,
        /// Issue date of the instrument.
        issue: Date,
    },

    /// An operation needs a settlement date and none is known.
    #[error("Settlement date must be set before setting a price or a yield")]
    SettlementDateRequired,

    /// Neither a price nor a yield is available to value from.
    #[error("Unable to determine yield to maturity.")]
    UnresolvedValuation,

    /// A floating-rate note cannot infer its current reference rate.
    #[error("Reference rate on {settlement} is unknown and cannot be inferred from the curve")]
    ReferenceRateUnavailable {
        /// Settlement date of the valuation.
        settlement: Date,
    },

    /// A floating-rate note has no reference curve dated on settlement.
    #[error("A reference rate curve dated {settlement} is required")]
    CurveRequired {
        /// Settlement date of the valuation.
        settlement: Date,
    },

    /// Neither a benchmark yield nor a benchmark curve was given.
    #[error("Either a benchmark yield or a benchmark curve must be provided")]
    MissingBenchmark,

    /// Core library error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Numerical error.
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Curve error.
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),
}

impl BondError {
    /// Creates an invalid specification error.
    #[must_use]
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Checks that a price is non-negative.
    pub(crate) fn check_price(price: f64) -> BondResult<f64> {
        if price < 0.0 {
            return Err(Self::NegativePrice { price });
        }
        Ok(price)
    }

    /// Checks a given price against one computed from a yield, with a
    /// relative tolerance of `1e-5`.
    pub(crate) fn check_price_match(given: f64, computed: f64) -> BondResult<()> {
        let gap = (computed - given).abs();
        let scaled = if given == 0.0 { gap } else { gap / given.abs() };
        if scaled > PRICE_MATCH_TOLERANCE {
            return Err(Self::PriceMismatch { given, computed });
        }
        Ok(())
    }
}

/// Relative tolerance between a quoted price and the price implied by a
/// quoted yield.
pub const PRICE_MATCH_TOLERANCE: f64 = 1e-5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BondError::invalid_spec("coupon frequency must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid bond specification: coupon frequency must be positive"
        );

        assert_eq!(
            BondError::UnresolvedValuation.to_string(),
            "Unable to determine yield to maturity."
        );
    }

    #[test]
    fn test_wrapped_errors() {
        let err: BondError = MathError::no_convergence(100, 1e-3).into();
        assert!(matches!(err, BondError::Math(MathError::NoConvergence { .. })));

        let err: BondError = CurveError::invalid_input("empty").into();
        assert!(err.to_string().starts_with("Curve error"));
    }

    #[test]
    fn test_check_price() {
        assert_eq!(BondError::check_price(99.5), Ok(99.5));
        assert!(matches!(
            BondError::check_price(-1.0),
            Err(BondError::NegativePrice { price }) if price == -1.0
        ));
    }

    #[test]
    fn test_check_price_match() {
        assert!(BondError::check_price_match(100.0, 100.0005).is_ok());
        assert!(matches!(
            BondError::check_price_match(100.0, 100.01),
            Err(BondError::PriceMismatch { .. })
        ));
        assert!(BondError::check_price_match(0.0, 0.0).is_ok());
    }
}
