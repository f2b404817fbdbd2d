//! Error types for curve operations.

use thiserror::Error;
use yieldline_core::{CoreError, Date};
use yieldline_math::MathError;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors raised while building or querying curves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Curves being combined do not share a curve date.
    #[error("Curve date mismatch: benchmark {benchmark}, spread {spread}")]
    CurveDateMismatch {
        /// Curve date of the benchmark curve.
        benchmark: Date,
        /// Curve date of the spread curve.
        spread: Date,
    },

    /// A calibration instrument does not settle on the curve date.
    #[error("Instrument settles on {settlement:?}, curve date is {curve_date}")]
    SettlementMismatch {
        /// Curve date.
        curve_date: Date,
        /// Settlement date of the instrument, if any.
        settlement: Option<Date>,
    },

    /// A time before the curve date.
    #[error("Time must be non-negative, got {t}")]
    NegativeTime {
        /// The offending time in years.
        t: f64,
    },

    /// Invalid curve input.
    #[error("Invalid curve input: {reason}")]
    InvalidInput {
        /// Description of what is wrong.
        reason: String,
    },

    /// A calibration instrument has no price.
    #[error("Instrument maturing {maturity} has no price")]
    MissingPrice {
        /// Maturity of the instrument.
        maturity: Date,
    },

    /// A bootstrap step could not be solved.
    #[error("Bootstrap failed at maturity {maturity:.4}: {reason}")]
    BootstrapFailed {
        /// Maturity in years of the failing point.
        maturity: f64,
        /// Description of the failure.
        reason: String,
    },

    /// Core library error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Numerical error.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl CurveError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a bootstrap failure error.
    #[must_use]
    pub fn bootstrap_failed(maturity: f64, reason: impl Into<String>) -> Self {
        Self::BootstrapFailed {
            maturity,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CurveError::NegativeTime { t: -0.5 };
        assert_eq!(err.to_string(), "Time must be non-negative, got -0.5");

        let err = CurveError::bootstrap_failed(2.0, "no unknown flows");
        assert!(err.to_string().contains("2.0000"));
    }

    #[test]
    fn test_from_math_error() {
        let err: CurveError = MathError::SingularSystem.into();
        assert!(matches!(err, CurveError::Math(_)));
    }
}
