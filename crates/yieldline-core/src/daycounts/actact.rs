//! Actual/Actual day count conventions.
//!
//! Both variants measure elapsed days against the actual length of the
//! accrual period, so they need the period end to be supplied.

use super::DayCount;
use crate::error::{CoreError, CoreResult};
use crate::types::{is_leap_year, Date};

fn period_end(end: Option<Date>, convention: &'static str) -> CoreResult<Date> {
    end.ok_or(CoreError::MissingPeriodEnd { convention })
}

/// Actual/Actual ISDA day count convention.
///
/// The year fraction splits `[start, current)` at calendar year boundaries
/// and divides each piece by the length of its year (365 or 366).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "actual/actual-ISDA"
    }

    fn requires_end(&self) -> bool {
        true
    }

    fn numerator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        period_end(end, self.name())?;
        Ok(start.days_between(&current) as f64)
    }

    fn denominator(&self, start: Date, _current: Date, end: Option<Date>) -> CoreResult<f64> {
        let end = period_end(end, self.name())?;
        Ok(start.days_between(&end) as f64)
    }

    fn fraction(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        period_end(end, self.name())?;

        let mut total = 0.0;
        let mut date = start;
        while date < current {
            let year_length = if is_leap_year(date.year()) {
                366.0
            } else {
                365.0
            };
            let next_year = Date::from_ymd(date.year() + 1, 1, 1)?;
            let slice_end = current.min(next_year);
            total += date.days_between(&slice_end) as f64 / year_length;
            date = slice_end;
        }
        Ok(total)
    }

    fn fraction_period_adjusted(
        &self,
        start: Date,
        current: Date,
        periods_per_year: u32,
        end: Option<Date>,
    ) -> CoreResult<f64> {
        let elapsed = self.numerator(start, current, end)?;
        let period = self.denominator(start, current, end)?;
        Ok(elapsed / period / f64::from(periods_per_year.max(1)))
    }
}

/// Actual/Actual Bond day count convention.
///
/// The fraction is the share of the accrual period that has elapsed:
/// actual days to `current` over actual days in `[start, end]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActBond;

impl DayCount for ActActBond {
    fn name(&self) -> &'static str {
        "actual/actual-Bond"
    }

    fn requires_end(&self) -> bool {
        true
    }

    fn numerator(&self, start: Date, current: Date, end: Option<Date>) -> CoreResult<f64> {
        period_end(end, self.name())?;
        Ok(start.days_between(&current) as f64)
    }

    fn denominator(&self, start: Date, _current: Date, end: Option<Date>) -> CoreResult<f64> {
        let end = period_end(end, self.name())?;
        Ok(start.days_between(&end) as f64)
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
    fn test_actact_requires_end() {
        let err = ActActBond
            .fraction(date(2025, 1, 1), date(2025, 4, 1), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingPeriodEnd { .. }));
        assert!(ActActIsda
            .numerator(date(2025, 1, 1), date(2025, 4, 1), None)
            .is_err());
    }

    #[test]
    fn test_actact_bond_period_share() {
        let dc = ActActBond;
        let start = date(2024, 1, 1);
        let end = date(2025, 1, 1);
        let current = date(2024, 7, 2);

        // 183 of 366 days
        assert_relative_eq!(dc.fraction(start, current, Some(end)).unwrap(), 0.5);
        assert_relative_eq!(
            dc.fraction_period_adjusted(start, current, 2, Some(end))
                .unwrap(),
            0.25
        );
    }

    #[test]
    fn test_actact_isda_cross_year() {
        let dc = ActActIsda;
        let start = date(2023, 7, 1);
        let current = date(2024, 7, 1);

        let expected = 184.0 / 365.0 + 182.0 / 366.0;
        assert_relative_eq!(
            dc.fraction(start, current, Some(current)).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_actact_isda_period_adjusted() {
        let dc = ActActIsda;
        let start = date(2025, 1, 1);
        let end = date(2025, 7, 1);
        let current = date(2025, 4, 1);

        let adjusted = dc
            .fraction_period_adjusted(start, current, 2, Some(end))
            .unwrap();
        assert_relative_eq!(adjusted, 90.0 / 181.0 / 2.0);
    }
}
