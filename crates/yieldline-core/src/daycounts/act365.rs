//! Actual/365 Fixed day count convention.

use super::DayCount;
use crate::error::CoreResult;
use crate::types::Date;

/// Actual/365 Fixed day count convention.
///
/// Actual days over a fixed 365-day year, regardless of leap years.
/// This is the convention annual and continuously compounded yields are
/// measured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365;

impl DayCount for Act365 {
    fn name(&self) -> &'static str {
        "actual/365"
    }

    fn numerator(&self, start: Date, current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(start.days_between(&current) as f64)
    }

    fn denominator(&self, _start: Date, _current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(365.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_act365_leap_year() {
        let dc = Act365;
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 1, 1).unwrap();

        assert_eq!(dc.numerator(start, end, None).unwrap(), 366.0);
        assert_relative_eq!(dc.fraction(start, end, None).unwrap(), 366.0 / 365.0);
    }

    #[test]
    fn test_act365_negative_span() {
        let dc = Act365;
        let start = Date::from_ymd(2025, 1, 1).unwrap();
        let end = Date::from_ymd(2024, 12, 27).unwrap();

        assert_relative_eq!(dc.fraction(start, end, None).unwrap(), -5.0 / 365.0);
    }
}
