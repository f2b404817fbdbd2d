//! Decimal rounding of reported analytics.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds `value` to `dp` decimal places, half away from zero.
///
/// Rounding is done in decimal so that reported figures do not carry binary
/// representation noise. Values outside the range of `Decimal` (or not
/// finite) are returned unchanged.
#[must_use]
pub fn round_to(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(4.329_476_543_219_87, 10), 4.329_476_543_2);
        assert_eq!(round_to(-0.123_456_789_016, 10), -0.123_456_789);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_round_to_non_finite_passthrough() {
        assert!(round_to(f64::NAN, 10).is_nan());
        assert_eq!(round_to(f64::INFINITY, 10), f64::INFINITY);
    }
}
