//! Serializable curve descriptions.

use serde::{Deserialize, Serialize};
use yieldline_core::{DayCountConvention, Date, YieldConvention};

/// Description of a yield curve's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveSnapshot {
    /// A single rate for every maturity.
    Flat {
        /// Curve date.
        curve_date: Date,
        /// The flat rate.
        rate: f64,
        /// Day count of the curve.
        day_count: DayCountConvention,
        /// Convention of the rate.
        yield_convention: YieldConvention,
    },
    /// Zero rates at node maturities.
    ZeroCoupon {
        /// Curve date.
        curve_date: Date,
        /// `(maturity in years, zero rate)` nodes.
        zero_rates: Vec<(f64, f64)>,
        /// Day count of the curve.
        day_count: DayCountConvention,
        /// Convention of the rates.
        yield_convention: YieldConvention,
    },
    /// A benchmark curve plus a credit spread curve.
    Combined {
        /// The benchmark curve.
        benchmark: Box<CurveSnapshot>,
        /// The spread curve.
        spread: SpreadSnapshot,
        /// Day count of the combined curve.
        day_count: DayCountConvention,
        /// Convention the combined rates are reported in.
        yield_convention: YieldConvention,
    },
}

/// Description of a credit spread curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpreadSnapshot {
    /// The same spread at every maturity.
    Flat {
        /// Curve date.
        curve_date: Date,
        /// The spread.
        spread: f64,
        /// Convention the spread is added in.
        yield_convention: YieldConvention,
    },
    /// Spreads at node maturities.
    Term {
        /// Curve date.
        curve_date: Date,
        /// `(maturity in years, spread)` nodes.
        spreads: Vec<(f64, f64)>,
        /// Day count of the curve.
        day_count: DayCountConvention,
        /// Convention the spreads are added in.
        yield_convention: YieldConvention,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_is_tagged() {
        let snapshot = CurveSnapshot::Flat {
            curve_date: Date::from_ymd(2025, 1, 1).unwrap(),
            rate: 0.05,
            day_count: DayCountConvention::Thirty360,
            yield_convention: YieldConvention::Bey,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"kind\":\"flat\""));
        assert!(json.contains("\"yield_convention\":\"BEY\""));

        let back: CurveSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
