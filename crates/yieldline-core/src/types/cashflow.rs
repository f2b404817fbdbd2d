//! Dated cash flow.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Date;

/// A single signed cash flow on a date.
///
/// Positive amounts are received by a long holder; the purchase price is
/// carried as a negative amount on the settlement date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Payment date.
    pub date: Date,
    /// Signed amount.
    pub amount: f64,
}

impl CashFlow {
    /// Creates a new cash flow.
    #[must_use]
    pub fn new(date: Date, amount: f64) -> Self {
        Self { date, amount }
    }

    /// Returns true for an outflow (a payment made by the holder).
    #[must_use]
    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }
}

impl fmt::Display for CashFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.date, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outflow() {
        let d = Date::from_ymd(2025, 1, 1).unwrap();
        assert!(CashFlow::new(d, -99.5).is_outflow());
        assert!(!CashFlow::new(d, 5.0).is_outflow());
        assert_eq!(CashFlow::new(d, 5.0).to_string(), "2025-01-01: 5.000000");
    }
}
