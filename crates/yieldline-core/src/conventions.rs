//! Yield quotation conventions.
//!
//! A yield convention fixes how an interest rate compounds. It is used
//! to quote bond yields and curve rates, and to move rates between quotes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Compounding basis used to quote a yield.
///
/// # Example
///
/// ```rust
/// use yieldline_core::conventions::YieldConvention;
///
/// let conv: YieldConvention = "bey".parse().unwrap();
/// assert_eq!(conv, YieldConvention::Bey);
/// assert_eq!(conv.time_adjustment(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum YieldConvention {
    /// Compounded once a year (effective annual rate).
    Annual,
    /// Bond equivalent yield: semi-annual compounding.
    Bey,
    /// Quarterly compounding.
    BeyQ,
    /// Monthly compounding.
    BeyM,
    /// Continuous compounding.
    Continuous,
    /// Simple money-market add-on rate.
    AddOn,
    /// Bank discount rate.
    Discount,
}

impl YieldConvention {
    /// Returns the canonical name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            YieldConvention::Annual => "Annual",
            YieldConvention::Bey => "BEY",
            YieldConvention::BeyQ => "BEY-Q",
            YieldConvention::BeyM => "BEY-M",
            YieldConvention::Continuous => "Continuous",
            YieldConvention::AddOn => "Add-On",
            YieldConvention::Discount => "Discount",
        }
    }

    /// Compounding periods per year for periodic conventions, `None` otherwise.
    #[must_use]
    pub fn periods_per_year(&self) -> Option<u32> {
        match self {
            YieldConvention::Annual => Some(1),
            YieldConvention::Bey => Some(2),
            YieldConvention::BeyQ => Some(4),
            YieldConvention::BeyM => Some(12),
            YieldConvention::Continuous | YieldConvention::AddOn | YieldConvention::Discount => {
                None
            }
        }
    }

    /// Factor applied to times (and removed from solved rates) when a
    /// yield in this convention is solved as a per-period rate.
    ///
    /// Non-periodic conventions use 1.
    #[must_use]
    pub fn time_adjustment(&self) -> f64 {
        self.periods_per_year().map_or(1.0, f64::from)
    }

    /// Whether this is a money-market simple-interest convention.
    #[must_use]
    pub fn is_money_market(&self) -> bool {
        matches!(self, YieldConvention::AddOn | YieldConvention::Discount)
    }

    /// Returns all conventions.
    #[must_use]
    pub fn all() -> &'static [YieldConvention] {
        &[
            YieldConvention::Annual,
            YieldConvention::Bey,
            YieldConvention::BeyQ,
            YieldConvention::BeyM,
            YieldConvention::Continuous,
            YieldConvention::AddOn,
            YieldConvention::Discount,
        ]
    }
}

impl fmt::Display for YieldConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for YieldConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "aer" | "effective" => Ok(YieldConvention::Annual),
            "bey" | "bey-s" => Ok(YieldConvention::Bey),
            "bey-q" => Ok(YieldConvention::BeyQ),
            "bey-m" => Ok(YieldConvention::BeyM),
            "continuous" | "log" => Ok(YieldConvention::Continuous),
            "add-on" | "addon" => Ok(YieldConvention::AddOn),
            "discount" => Ok(YieldConvention::Discount),
            _ => Err(CoreError::UnknownConvention {
                kind: "yield",
                name: s.to_string(),
                supported: YieldConvention::all()
                    .iter()
                    .map(YieldConvention::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

impl TryFrom<String> for YieldConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YieldConvention> for String {
    fn from(value: YieldConvention) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_adjustment() {
        assert_eq!(YieldConvention::Annual.time_adjustment(), 1.0);
        assert_eq!(YieldConvention::Bey.time_adjustment(), 2.0);
        assert_eq!(YieldConvention::BeyQ.time_adjustment(), 4.0);
        assert_eq!(YieldConvention::BeyM.time_adjustment(), 12.0);
        assert_eq!(YieldConvention::Continuous.time_adjustment(), 1.0);
        assert_eq!(YieldConvention::Discount.time_adjustment(), 1.0);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("BEY-S".parse::<YieldConvention>().unwrap(), YieldConvention::Bey);
        assert_eq!("add-on".parse::<YieldConvention>().unwrap(), YieldConvention::AddOn);
        for conv in YieldConvention::all() {
            assert_eq!(conv.name().parse::<YieldConvention>().unwrap(), *conv);
        }
    }

    #[test]
    fn test_unknown_convention() {
        let err = "semi".parse::<YieldConvention>().unwrap_err();
        assert!(err.to_string().contains("Unknown yield convention"));
        assert!(err.to_string().contains("BEY-Q"));
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&YieldConvention::BeyQ).unwrap();
        assert_eq!(json, "\"BEY-Q\"");
        let back: YieldConvention = serde_json::from_str(&json).unwrap();
        assert_eq!(back, YieldConvention::BeyQ);
    }
}
