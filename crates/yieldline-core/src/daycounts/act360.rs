//! Actual/360 day count convention.
//!
//! Used primarily for money market instruments.

use super::DayCount;
use crate::error::CoreResult;
use crate::types::Date;

/// Actual/360 day count convention.
///
/// The day count is the actual number of days between dates.
/// The year basis is always 360 days.
///
/// # Usage
///
/// - Money market instruments (T-Bills, Commercial Paper)
/// - Floating rate notes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "actual/360"
    }

    fn numerator(&self, start: Date, current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(start.days_between(&current) as f64)
    }

    fn denominator(&self, _start: Date, _current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_act360_basic() {
        let dc = Act360;
        let start = Date::from_ymd(2025, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 4, 1).unwrap();

        // Jan has 31, Feb has 28, Mar has 31 = 90 days
        assert_eq!(dc.numerator(start, end, None).unwrap(), 90.0);
        assert_relative_eq!(dc.fraction(start, end, None).unwrap(), 0.25);
    }

    #[test]
    fn test_act360_full_year() {
        let dc = Act360;
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 1, 1).unwrap();

        // Leap year: 366 days / 360
        assert_relative_eq!(dc.fraction(start, end, None).unwrap(), 366.0 / 360.0);
    }
}
