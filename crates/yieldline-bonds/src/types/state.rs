//! Settlement date and quote of an instrument.

use serde::{Deserialize, Serialize};
use yieldline_core::Date;

/// Which side of a quote the caller supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSource {
    /// The price was set and the yield derived from it.
    Price,
    /// The yield was set and the price derived from it.
    Yield,
}

/// Valuation cache of an instrument.
///
/// A quote cannot exist without a settlement date, and a quote always
/// carries both its price and its yield. For floating-rate notes the yield
/// slot holds the discount margin in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ValuationState {
    /// No settlement date.
    #[default]
    Unsettled,
    /// Settlement date known, no quote.
    Settled {
        /// Settlement date.
        settlement: Date,
    },
    /// Settlement date with a consistent price and yield.
    Quoted {
        /// Settlement date.
        settlement: Date,
        /// Price at settlement.
        price: f64,
        /// Yield (or discount margin) at settlement.
        ytm: f64,
        /// Which field the caller set.
        source: QuoteSource,
    },
}

impl ValuationState {
    /// State for an optional settlement date without a quote.
    #[must_use]
    pub fn settled(settlement: Option<Date>) -> Self {
        settlement.map_or(Self::Unsettled, |settlement| Self::Settled { settlement })
    }

    /// Settlement date, if any.
    #[must_use]
    pub fn settlement(&self) -> Option<Date> {
        match self {
            Self::Unsettled => None,
            Self::Settled { settlement } | Self::Quoted { settlement, .. } => Some(*settlement),
        }
    }

    /// Quoted price, if any.
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Quoted { price, .. } => Some(*price),
            _ => None,
        }
    }

    /// Quoted yield, if any.
    #[must_use]
    pub fn yield_to_maturity(&self) -> Option<f64> {
        match self {
            Self::Quoted { ytm, .. } => Some(*ytm),
            _ => None,
        }
    }

    /// Which field of the quote was set by the caller.
    #[must_use]
    pub fn source(&self) -> Option<QuoteSource> {
        match self {
            Self::Quoted { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// Stored `(ytm, price)` if the state is quoted at `settlement`.
    #[must_use]
    pub fn quote_at(&self, settlement: Date) -> Option<(f64, f64)> {
        match self {
            Self::Quoted {
                settlement: quoted,
                price,
                ytm,
                ..
            } if *quoted == settlement => Some((*ytm, *price)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> Date {
        Date::from_ymd(2022, 1, 3).unwrap()
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ValuationState::default().settlement(), None);
        assert_eq!(ValuationState::settled(Some(date())).settlement(), Some(date()));
        assert_eq!(ValuationState::settled(Some(date())).price(), None);

        let quoted = ValuationState::Quoted {
            settlement: date(),
            price: 99.5,
            ytm: 0.051,
            source: QuoteSource::Price,
        };
        assert_eq!(quoted.price(), Some(99.5));
        assert_eq!(quoted.yield_to_maturity(), Some(0.051));
        assert_eq!(quoted.source(), Some(QuoteSource::Price));
        assert_eq!(quoted.quote_at(date()), Some((0.051, 99.5)));
        assert_eq!(quoted.quote_at(date().add_days(1)), None);
    }

    #[test]
    fn test_state_serializes() {
        let state = ValuationState::Settled { settlement: date() };
        let json = serde_json::to_string(&state).unwrap();
        let back: ValuationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
