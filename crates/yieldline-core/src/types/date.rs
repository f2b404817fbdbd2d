//! Date type for valuation calculations.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// A calendar date used for schedules, settlement and curve anchoring.
///
/// Newtype around `chrono::NaiveDate`. Business days are weekdays: there is
/// no holiday calendar, so "business day" arithmetic only skips Saturdays
/// and Sundays.
///
/// # Example
///
/// ```rust
/// use yieldline_core::types::Date;
///
/// let date = Date::from_ymd(2025, 1, 31).unwrap();
/// let next = date.add_months(1).unwrap();
/// assert_eq!(next, Date::from_ymd(2025, 2, 28).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from an ISO 8601 string (YYYY-MM-DD).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the string is not a valid date.
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Checks if the year is a leap year.
    #[must_use]
    pub fn is_leap_year(&self) -> bool {
        self.0.leap_year()
    }

    /// Returns the number of days in the date's year.
    #[must_use]
    pub fn days_in_year(&self) -> u32 {
        if self.is_leap_year() {
            366
        } else {
            365
        }
    }

    /// Adds a number of days to the date.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Adds a number of months to the date.
    ///
    /// If the resulting day would be invalid (e.g., Jan 31 + 1 month),
    /// it rolls back to the last valid day of the month.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let total_months = self.year() * 12 + self.month() as i32 - 1 + months;
        let new_year = total_months.div_euclid(12);
        let new_month = (total_months.rem_euclid(12) + 1) as u32;

        let max_day = days_in_month(new_year, new_month);
        Self::from_ymd(new_year, new_month, self.day().min(max_day))
    }

    /// Adds a number of years to the date, clamping Feb 29 to Feb 28.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn add_years(&self, years: i32) -> CoreResult<Self> {
        self.add_months(years * 12)
    }

    /// Calculates the number of calendar days from `self` to `other`.
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Returns the day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Checks if the date is a weekend (Saturday or Sunday).
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Checks if the date is a weekday (Monday through Friday).
    #[must_use]
    pub fn is_weekday(&self) -> bool {
        !self.is_weekend()
    }

    /// Rolls a weekend date forward to the following Monday.
    ///
    /// Weekdays are returned unchanged.
    #[must_use]
    pub fn roll_following(&self) -> Self {
        let mut date = *self;
        while date.is_weekend() {
            date = date.add_days(1);
        }
        date
    }

    /// Adds business days (weekdays only) to the date.
    ///
    /// Positive values move forward, negative values move backward. A zero
    /// offset still lands on a business day: weekend dates roll forward.
    #[must_use]
    pub fn add_business_days(&self, days: i32) -> Self {
        if days == 0 {
            return self.roll_following();
        }

        let direction = if days > 0 { 1i64 } else { -1i64 };
        let mut remaining = days.abs();
        let mut current = *self;

        while remaining > 0 {
            current = current.add_days(direction);
            if current.is_weekday() {
                remaining -= 1;
            }
        }

        current
    }

    /// Returns the underlying `NaiveDate`.
    #[must_use]
    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl From<Date> for NaiveDate {
    fn from(date: Date) -> Self {
        date.0
    }
}

impl Add<i64> for Date {
    type Output = Self;

    fn add(self, days: i64) -> Self::Output {
        self.add_days(days)
    }
}

impl Sub<i64> for Date {
    type Output = Self;

    fn sub(self, days: i64) -> Self::Output {
        self.add_days(-days)
    }
}

impl Sub<Date> for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    fn sub(self, other: Date) -> Self::Output {
        other.days_between(&self)
    }
}

/// Days in a month for a given year.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Gregorian leap year rule.
pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_date_creation() {
        let d = date(2025, 6, 15);
        assert_eq!(d.year(), 2025);
        assert_eq!(d.month(), 6);
        assert_eq!(d.day(), 15);
    }

    #[test]
    fn test_invalid_date() {
        assert!(Date::from_ymd(2025, 2, 30).is_err());
        assert!(Date::from_ymd(2025, 13, 1).is_err());
        assert!(Date::parse("2025-02-30").is_err());
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(date(2025, 1, 31).add_months(1).unwrap(), date(2025, 2, 28));
        assert_eq!(date(2024, 1, 31).add_months(1).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_add_months_backwards_across_year() {
        assert_eq!(date(2025, 1, 1).add_months(-6).unwrap(), date(2024, 7, 1));
        assert_eq!(date(2025, 1, 1).add_months(-12).unwrap(), date(2024, 1, 1));
        assert_eq!(date(2025, 3, 31).add_months(-1).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_add_years_leap_day() {
        assert_eq!(date(2024, 2, 29).add_years(1).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(date(2025, 1, 1).days_between(&date(2025, 1, 31)), 30);
        assert_eq!(date(2025, 1, 31) - date(2025, 1, 1), 30);
    }

    #[test]
    fn test_roll_following() {
        // 2022-01-01 is a Saturday
        assert_eq!(date(2022, 1, 1).roll_following(), date(2022, 1, 3));
        // 2023-01-01 is a Sunday
        assert_eq!(date(2023, 1, 1).roll_following(), date(2023, 1, 2));
        assert_eq!(date(2021, 1, 1).roll_following(), date(2021, 1, 1));
    }

    #[test]
    fn test_add_business_days() {
        let monday = date(2025, 1, 6);
        assert_eq!(monday.add_business_days(5), date(2025, 1, 13));
        assert_eq!(monday.add_business_days(1), date(2025, 1, 7));
        assert_eq!(monday.add_business_days(-1), date(2025, 1, 3));

        let friday = date(2025, 1, 3);
        assert_eq!(friday.add_business_days(1), monday);

        let saturday = date(2025, 1, 4);
        assert_eq!(saturday.add_business_days(1), monday);
        assert_eq!(saturday.add_business_days(0), monday);
    }

    #[test]
    fn test_weekday_detection() {
        assert!(date(2025, 1, 6).is_weekday());
        assert!(date(2025, 1, 4).is_weekend());
        assert_eq!(date(2025, 1, 5).weekday(), Weekday::Sun);
    }

    #[test]
    fn test_display_and_from_str() {
        let d: Date = "2025-06-15".parse().unwrap();
        assert_eq!(format!("{}", d), "2025-06-15");
    }

    #[test]
    fn test_serde() {
        let d = date(2025, 6, 15);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2025-06-15\"");
        let parsed: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(d, parsed);
    }
}
