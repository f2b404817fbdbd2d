//! Day count conventions for fixed income calculations.
//!
//! A day count convention turns two dates into a year fraction by fixing
//! how days are counted (the numerator) and how long a year is (the
//! denominator).
//!
//! # Supported Conventions
//!
//! - [`Thirty360`]: 30/360
//! - [`Thirty360E`]: 30E/360 (Eurobond basis)
//! - [`Thirty365`]: 30/365
//! - [`Act360`]: actual/360, money market convention
//! - [`Act365`]: actual/365 fixed
//! - [`ActActIsda`]: actual/actual ISDA, year-split
//! - [`ActActBond`]: actual/actual Bond, share of the coupon period
//!
//! Every calculation takes a `start` (previous coupon, issue or investment
//! date), a `current` date (settlement or payment date) and an optional
//! `end` of the accrual period. Only the actual/actual family reads `end`.
//!
//! # Usage
//!
//! ```rust
//! use yieldline_core::daycounts::{DayCount, DayCountConvention};
//! use yieldline_core::types::Date;
//!
//! let dc: DayCountConvention = "30/360".parse().unwrap();
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//!
//! assert_eq!(dc.fraction(start, end, None).unwrap(), 0.5);
//! ```

mod act360;
mod act365;
mod actact;
mod thirty360;

pub use act360::Act360;
pub use act365::Act365;
pub use actact::{ActActBond, ActActIsda};
pub use thirty360::{Thirty360, Thirty360E, Thirty365};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// Trait for day count conventions.
///
/// Implementations provide the numerator and denominator; the year fraction
/// and its per-period variant are derived from them unless a convention
/// needs its own rule.
pub trait DayCount: Send + Sync {
    /// Returns the registry name of the convention (e.g. "30/360").
    fn name(&self) -> &'static str;

    /// Whether the convention measures against the accrual period and
    /// therefore needs `end`.
    fn requires_end(&self) -> bool {
        false
    }

    /// Day count from `start` to `current`.
    fn numerator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64>;

    /// Length of the year (or period) the numerator is measured against.
    fn denominator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64>;

    /// Year fraction between `start` and `current`.
    fn fraction(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        Ok(self.numerator(start, current, end)? / self.denominator(start, current, end)?)
    }

    /// Year fraction divided by the number of coupon periods per year.
    ///
    /// A frequency of zero is treated as one period per year.
    fn fraction_period_adjusted(
        &self,
        start: Date,
        current: Date,
        periods_per_year: u32,
        end: Option<Date>,
    ) -> CoreResult<f64> {
        Ok(self.fraction(start, current, end)? / f64::from(periods_per_year.max(1)))
    }
}

/// Accrual-period year fraction used for accrued interest and elapsed time.
///
/// Period-relative conventions report the elapsed share of the period
/// scaled to years (`fraction_period_adjusted`); all others report the plain
/// year fraction. Either way the result is in years.
pub fn accrual_fraction(
    dc: &dyn DayCount,
    start: Date,
    current: Date,
    periods_per_year: u32,
    end: Option<Date>,
) -> CoreResult<f64> {
    if dc.requires_end() {
        dc.fraction_period_adjusted(start, current, periods_per_year, end)
    } else {
        dc.fraction(start, current, end)
    }
}

/// Enumeration of all supported day count conventions.
///
/// Selected by name at construction time and dispatched statically
/// afterwards. Serializes as its registry name.
///
/// # Example
///
/// ```rust
/// use yieldline_core::daycounts::{DayCount, DayCountConvention};
/// use yieldline_core::types::Date;
///
/// let convention = DayCountConvention::Act360;
/// let start = Date::from_ymd(2025, 1, 1).unwrap();
/// let end = Date::from_ymd(2025, 4, 1).unwrap();
/// assert_eq!(convention.fraction(start, end, None).unwrap(), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayCountConvention {
    /// 30/360
    Thirty360,
    /// 30E/360 (Eurobond basis)
    Thirty360E,
    /// Actual/Actual ISDA
    ActActIsda,
    /// Actual/Actual Bond
    ActActBond,
    /// Actual/360
    Act360,
    /// Actual/365 Fixed
    Act365,
    /// 30/365
    Thirty365,
}

impl DayCountConvention {
    fn inner(self) -> &'static dyn DayCount {
        match self {
            DayCountConvention::Thirty360 => &Thirty360,
            DayCountConvention::Thirty360E => &Thirty360E,
            DayCountConvention::ActActIsda => &ActActIsda,
            DayCountConvention::ActActBond => &ActActBond,
            DayCountConvention::Act360 => &Act360,
            DayCountConvention::Act365 => &Act365,
            DayCountConvention::Thirty365 => &Thirty365,
        }
    }

    /// Returns all available day count conventions.
    #[must_use]
    pub fn all() -> &'static [DayCountConvention] {
        &[
            DayCountConvention::Thirty360,
            DayCountConvention::Thirty360E,
            DayCountConvention::ActActIsda,
            DayCountConvention::Act360,
            DayCountConvention::Act365,
            DayCountConvention::Thirty365,
            DayCountConvention::ActActBond,
        ]
    }

    /// Comma separated registry names, for error messages.
    #[must_use]
    pub fn supported_names() -> String {
        Self::all()
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl DayCount for DayCountConvention {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn requires_end(&self) -> bool {
        self.inner().requires_end()
    }

    fn numerator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        self.inner().numerator(start, current, end)
    }

    fn denominator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        self.inner().denominator(start, current, end)
    }

    fn fraction(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        self.inner().fraction(start, current, end)
    }

    fn fraction_period_adjusted(
        &self,
        start: Date,
        current: Date,
        periods_per_year: u32,
        end: Option<Date>,
    ) -> CoreResult<f64> {
        self.inner()
            .fraction_period_adjusted(start, current, periods_per_year, end)
    }
}

impl std::fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DayCountConvention {
    type Err = CoreError;

    /// Parses a day count convention from its registry name or a common
    /// alias, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        match normalized.as_str() {
            "30/360" | "30/360 us" | "30u/360" | "bond" | "thirty360" => {
                Ok(DayCountConvention::Thirty360)
            }
            "30e/360" | "30/360e" | "eurobond" | "thirty360e" => Ok(DayCountConvention::Thirty360E),
            "30/365" | "thirty365" => Ok(DayCountConvention::Thirty365),
            "actual/360" | "act/360" | "act360" => Ok(DayCountConvention::Act360),
            "actual/365" | "act/365" | "act/365f" | "actual/365 fixed" | "act365" => {
                Ok(DayCountConvention::Act365)
            }
            "actual/actual-isda" | "act/act isda" | "act/act-isda" | "actual/actual" | "act/act" => {
                Ok(DayCountConvention::ActActIsda)
            }
            "actual/actual-bond" | "act/act bond" | "act/act-bond" => {
                Ok(DayCountConvention::ActActBond)
            }
            _ => Err(CoreError::UnknownConvention {
                kind: "day count",
                name: s.to_string(),
                supported: Self::supported_names(),
            }),
        }
    }
}

impl TryFrom<String> for DayCountConvention {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayCountConvention> for String {
    fn from(value: DayCountConvention) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_registry_names_round_trip() {
        for convention in DayCountConvention::all() {
            let parsed: DayCountConvention = convention.name().parse().unwrap();
            assert_eq!(parsed, *convention);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "ACTUAL/ACTUAL-bond".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::ActActBond
        );
        assert_eq!(
            " Actual/365 ".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::Act365
        );
    }

    #[test]
    fn test_unknown_name_lists_supported() {
        let err = "actual/999".parse::<DayCountConvention>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("actual/999"));
        assert!(msg.contains("30e/360"));
        assert!(msg.contains("actual/actual-Bond"));
    }

    #[test]
    fn test_all_conventions_roughly_half_year() {
        let start = date(2025, 1, 1);
        let current = date(2025, 7, 1);
        let end = date(2026, 1, 1);
        for convention in DayCountConvention::all() {
            let yf = convention.fraction(start, current, Some(end)).unwrap();
            assert!(yf > 0.4 && yf < 0.6, "{convention}: {yf}");
        }
    }

    #[test]
    fn test_accrual_fraction_is_in_years() {
        let start = date(2025, 1, 1);
        let current = date(2025, 4, 1);
        let end = date(2025, 7, 1);

        let bond = accrual_fraction(&DayCountConvention::ActActBond, start, current, 2, Some(end))
            .unwrap();
        assert_relative_eq!(bond, 90.0 / 181.0 / 2.0);

        let thirty = accrual_fraction(&DayCountConvention::Thirty360, start, current, 2, Some(end))
            .unwrap();
        assert_relative_eq!(thirty, 0.25);
    }

    #[test]
    fn test_serde_uses_registry_name() {
        let json = serde_json::to_string(&DayCountConvention::Thirty360E).unwrap();
        assert_eq!(json, "\"30e/360\"");
        let parsed: DayCountConvention = serde_json::from_str("\"actual/365\"").unwrap();
        assert_eq!(parsed, DayCountConvention::Act365);
        assert!(serde_json::from_str::<DayCountConvention>("\"bogus\"").is_err());
    }
}
