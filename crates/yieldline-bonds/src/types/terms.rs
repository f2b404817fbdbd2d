//! Contractual terms of an instrument.

use serde::{Deserialize, Serialize};
use yieldline_core::Date;

use crate::error::{BondError, BondResult};

/// Immutable terms shared by every instrument kind.
///
/// `cpn` is the annual coupon in percent of notional and `cpn_freq` the
/// number of coupons per year (zero for instruments without periodic
/// coupons). Settlement lags are in business days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentTerms {
    /// Issue date.
    pub issue_date: Date,
    /// Maturity date.
    pub maturity: Date,
    /// Face amount repaid over the life of the instrument.
    pub notional: f64,
    /// Annual coupon rate in percent.
    pub cpn: f64,
    /// Coupon payments per year.
    pub cpn_freq: u32,
    /// Business days between trade and settlement.
    pub settlement_t_plus: u32,
    /// Business days before a payment date at which its holder is fixed.
    pub record_date_t_minus: u32,
}

impl InstrumentTerms {
    /// Checks the terms for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `BondError::InvalidSpec` if the notional or coupon is
    /// negative, if a coupon has no frequency, if the frequency does not
    /// divide a year into whole months, or if maturity precedes issue.
    pub fn validate(&self) -> BondResult<()> {
        if self.notional < 0.0 {
            return Err(BondError::invalid_spec("notional must be non-negative"));
        }
        if self.cpn < 0.0 {
            return Err(BondError::invalid_spec("coupon must be non-negative"));
        }
        if self.cpn > 0.0 && self.cpn_freq == 0 {
            return Err(BondError::invalid_spec(
                "coupon frequency must be positive when the coupon is positive",
            ));
        }
        if self.cpn_freq > 0 && 12 % self.cpn_freq != 0 {
            return Err(BondError::invalid_spec(format!(
                "coupon frequency {} does not divide twelve months",
                self.cpn_freq
            )));
        }
        if self.maturity < self.issue_date {
            return Err(BondError::invalid_spec(format!(
                "maturity {} is before issue date {}",
                self.maturity, self.issue_date
            )));
        }
        Ok(())
    }

    /// Coupon paid each period.
    #[must_use]
    pub fn coupon_per_period(&self) -> f64 {
        if self.cpn_freq == 0 {
            return 0.0;
        }
        self.cpn / f64::from(self.cpn_freq) * self.notional / 100.0
    }

    /// Record date lag as a signed business-day count.
    pub(crate) fn record_lag(&self) -> i32 {
        self.record_date_t_minus as i32
    }

    /// Checks that `settlement` is not before issue.
    pub(crate) fn check_settlement(&self, settlement: Date) -> BondResult<Date> {
        if settlement < self.issue_date {
            return Err(BondError::SettlementBeforeIssue {
                settlement,
                issue: self.issue_date,
            });
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> InstrumentTerms {
        InstrumentTerms {
            issue_date: Date::from_ymd(2020, 1, 1).unwrap(),
            maturity: Date::from_ymd(2025, 1, 1).unwrap(),
            notional: 1000.0,
            cpn: 5.0,
            cpn_freq: 2,
            settlement_t_plus: 1,
            record_date_t_minus: 1,
        }
    }

    #[test]
    fn test_coupon_per_period() {
        assert_eq!(terms().coupon_per_period(), 25.0);

        let zero = InstrumentTerms {
            cpn: 0.0,
            cpn_freq: 0,
            ..terms()
        };
        assert_eq!(zero.coupon_per_period(), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(terms().validate().is_ok());

        let no_freq = InstrumentTerms {
            cpn_freq: 0,
            ..terms()
        };
        assert!(matches!(no_freq.validate(), Err(BondError::InvalidSpec { .. })));

        let odd_freq = InstrumentTerms {
            cpn_freq: 5,
            ..terms()
        };
        assert!(odd_freq.validate().is_err());

        let negative = InstrumentTerms {
            notional: -1.0,
            ..terms()
        };
        assert!(negative.validate().is_err());

        let inverted = InstrumentTerms {
            maturity: Date::from_ymd(2019, 1, 1).unwrap(),
            ..terms()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_settlement_before_issue() {
        let early = Date::from_ymd(2019, 12, 31).unwrap();
        assert!(matches!(
            terms().check_settlement(early),
            Err(BondError::SettlementBeforeIssue { .. })
        ));
    }
}
