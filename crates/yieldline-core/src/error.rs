//! Error types for the core crate.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by dates, day counts and rate conversions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A convention name that is not recognised.
    #[error("Unknown {kind} convention: '{name}'. Supported: {supported}")]
    UnknownConvention {
        /// Which family of convention was being parsed.
        kind: &'static str,
        /// The name supplied by the caller.
        name: String,
        /// Comma separated list of accepted names.
        supported: String,
    },

    /// Period-relative day counts need the end of the accrual period.
    #[error("end date is required for {convention}")]
    MissingPeriodEnd {
        /// Name of the day count convention.
        convention: &'static str,
    },

    /// A rate outside the domain of a conversion.
    #[error("Invalid rate: {value} - {reason}")]
    InvalidRate {
        /// The offending rate.
        value: f64,
        /// Reason for invalidity.
        reason: String,
    },

    /// No generic conversion exists between two conventions.
    #[error("Cannot convert a rate from {from} to {to}")]
    UnsupportedConversion {
        /// Source convention name.
        from: &'static str,
        /// Target convention name.
        to: &'static str,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid rate error.
    #[must_use]
    pub fn invalid_rate(value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            value,
            reason: reason.into(),
        }
    }
}
