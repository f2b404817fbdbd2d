//! Domain types.

mod cashflow;
mod date;

pub use cashflow::CashFlow;
pub use date::Date;

pub(crate) use date::is_leap_year;
