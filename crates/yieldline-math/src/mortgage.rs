//! Level-payment loans and their amortization.

use tracing::trace;

use crate::error::{MathError, MathResult};

/// Terms of a level-payment loan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelPaymentLoan {
    /// Amount borrowed.
    pub principal: f64,
    /// Nominal annual rate, decimal.
    pub annual_rate: f64,
    /// Term in months.
    pub term_months: u32,
    /// Months between payments, 1 for monthly.
    pub payment_interval_months: u32,
}

/// One period of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationRow {
    /// Payment number, from 1.
    pub period: u32,
    /// Level payment.
    pub payment: f64,
    /// Interest on the balance at the start of the period.
    pub interest: f64,
    /// Principal repaid.
    pub principal: f64,
    /// Balance after the payment, floored at zero.
    pub remaining_balance: f64,
}

impl LevelPaymentLoan {
    /// A monthly-pay loan.
    #[must_use]
    pub fn monthly(principal: f64, annual_rate: f64, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            payment_interval_months: 1,
        }
    }

    /// Sets the months between payments.
    #[must_use]
    pub fn with_payment_interval(mut self, months: u32) -> Self {
        self.payment_interval_months = months;
        self
    }

    /// Number of payments. A trailing part-interval is not paid.
    #[must_use]
    pub fn payments(&self) -> u32 {
        self.term_months
            .checked_div(self.payment_interval_months)
            .unwrap_or(0)
    }

    /// Rate per payment period.
    #[must_use]
    pub fn periodic_rate(&self) -> f64 {
        self.annual_rate * f64::from(self.payment_interval_months) / 12.0
    }

    /// Level payment that repays the principal over the term.
    ///
    /// `P · r / (1 − (1 + r)^−N)`, or `P / N` at a zero rate.
    ///
    /// # Errors
    ///
    /// `MathError::BadArgument` for a zero payment interval or a term
    /// shorter than one interval.
    ///
    /// # Example
    ///
    /// ```rust
    /// use yieldline_math::mortgage::LevelPaymentLoan;
    ///
    /// let loan = LevelPaymentLoan::monthly(200_000.0, 0.04, 360);
    /// assert!((loan.payment().unwrap() - 954.830_590_930_9).abs() < 1e-6);
    /// ```
    pub fn payment(&self) -> MathResult<f64> {
        if self.payment_interval_months == 0 {
            return Err(MathError::bad_argument("payment interval must be at least one month"));
        }
        let n = self.payments();
        if n == 0 {
            return Err(MathError::bad_argument(format!(
                "term of {} months is shorter than the {}-month payment interval",
                self.term_months, self.payment_interval_months
            )));
        }
        let r = self.periodic_rate();
        if r == 0.0 {
            return Ok(self.principal / f64::from(n));
        }
        Ok(self.principal * r / (1.0 - (1.0 + r).powf(-f64::from(n))))
    }

    /// Interest and principal split of every payment.
    ///
    /// # Errors
    ///
    /// `MathError::BadArgument` for a non-positive principal or term, or
    /// anything [`LevelPaymentLoan::payment`] rejects.
    pub fn schedule(&self) -> MathResult<Vec<AmortizationRow>> {
        if self.principal <= 0.0 {
            return Err(MathError::bad_argument(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.term_months == 0 {
            return Err(MathError::bad_argument("loan term must be at least one month"));
        }
        let payment = self.payment()?;
        let r = self.periodic_rate();

        let mut balance = self.principal;
        let rows: Vec<AmortizationRow> = (1..=self.payments())
            .map(|period| {
                let interest = balance * r;
                let principal = payment - interest;
                balance -= principal;
                AmortizationRow {
                    period,
                    payment,
                    interest,
                    principal,
                    remaining_balance: balance.max(0.0),
                }
            })
            .collect();
        trace!(payments = rows.len(), payment, "amortized level-payment loan");
        Ok(rows)
    }
}
