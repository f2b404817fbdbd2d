//! 30/360 family of day count conventions.

use super::DayCount;
use crate::error::CoreResult;
use crate::types::Date;

/// Days between two dates on a 30-day-month grid after day adjustment.
#[inline]
fn thirty_day_numerator(start: Date, current: Date, d1: u32, d2: u32) -> f64 {
    let years = f64::from(current.year() - start.year());
    let months = f64::from(current.month() as i32 - start.month() as i32);
    let days = f64::from(d2 as i32 - d1 as i32);
    360.0 * years + 30.0 * months + days
}

/// 30/360 day count convention.
///
/// # Rules
///
/// 1. If D1 is 31, change D1 to 30
/// 2. If D2 is 31 and D1 is now 30, change D2 to 30
///
/// February is not given end-of-month treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360;

impl DayCount for Thirty360 {
    fn name(&self) -> &'static str {
        "30/360"
    }

    fn numerator(&self, start: Date, current: Date, _end: Option<Date>) -> CoreResult<f64> {
        let d1 = if start.day() == 31 { 30 } else { start.day() };
        let d2 = if current.day() == 31 && d1 == 30 {
            30
        } else {
            current.day()
        };
        Ok(thirty_day_numerator(start, current, d1, d2))
    }

    fn denominator(&self, _start: Date, _current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(360.0)
    }
}

/// 30E/360 day count convention (Eurobond basis).
///
/// Both day components are capped at 30.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30e/360"
    }

    fn numerator(&self, start: Date, current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(thirty_day_numerator(
            start,
            current,
            start.day().min(30),
            current.day().min(30),
        ))
    }

    fn denominator(&self, _start: Date, _current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(360.0)
    }
}

/// 30/365 day count convention.
///
/// Day 31 becomes 30 on both ends, and the year has 365 days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty365;

impl DayCount for Thirty365 {
    fn name(&self) -> &'static str {
        "30/365"
    }

    fn numerator(&self, start: Date, current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(thirty_day_numerator(
            start,
            current,
            if start.day() == 31 { 30 } else { start.day() },
            if current.day() == 31 { 30 } else { current.day() },
        ))
    }

    fn denominator(&self, _start: Date, _current: Date, _end: Option<Date>) -> CoreResult<f64> {
        Ok(365.0)
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
    fn test_thirty360_full_year() {
        let dc = Thirty360;
        assert_eq!(
            dc.numerator(date(2025, 1, 1), date(2026, 1, 1), None).unwrap(),
            360.0
        );
        assert_eq!(
            dc.fraction(date(2025, 1, 1), date(2026, 1, 1), None).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_thirty360_day_31_rules() {
        let dc = Thirty360;
        // D1 = 31 -> 30, then D2 = 31 -> 30
        assert_eq!(
            dc.numerator(date(2025, 1, 31), date(2025, 3, 31), None).unwrap(),
            60.0
        );
        // D1 = 30, D2 = 31 -> 30
        assert_eq!(
            dc.numerator(date(2025, 4, 30), date(2025, 5, 31), None).unwrap(),
            30.0
        );
        // D1 = 15, D2 = 31 stays
        assert_eq!(
            dc.numerator(date(2025, 1, 15), date(2025, 1, 31), None).unwrap(),
            16.0
        );
    }

    #[test]
    fn test_thirty360_february() {
        // No end-of-month rule for February
        let dc = Thirty360;
        assert_eq!(
            dc.numerator(date(2025, 2, 28), date(2025, 3, 31), None).unwrap(),
            33.0
        );
    }

    #[test]
    fn test_thirty360e_caps_both_days() {
        let dc = Thirty360E;
        assert_eq!(
            dc.numerator(date(2025, 1, 15), date(2025, 1, 31), None).unwrap(),
            15.0
        );
        assert_eq!(
            dc.numerator(date(2025, 1, 31), date(2025, 7, 31), None).unwrap(),
            180.0
        );
    }

    #[test]
    fn test_thirty365() {
        let dc = Thirty365;
        assert_eq!(
            dc.numerator(date(2025, 1, 15), date(2025, 1, 31), None).unwrap(),
            15.0
        );
        assert_relative_eq!(
            dc.fraction(date(2025, 1, 1), date(2026, 1, 1), None).unwrap(),
            360.0 / 365.0
        );
    }

    #[test]
    fn test_period_adjusted_divides_by_frequency() {
        let dc = Thirty360;
        let adjusted = dc
            .fraction_period_adjusted(date(2025, 1, 1), date(2025, 7, 1), 2, None)
            .unwrap();
        assert_relative_eq!(adjusted, 0.25);
    }
}
