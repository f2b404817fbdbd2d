//! Cash flow schedules, settlement filtering and tabular export.
//!
//! - [`CashFlowSchedule`]: payments split into coupons and amortization
//! - [`FlowFilter`]: what a buyer settling on a date receives
//! - [`CashFlowTable`]: dated rows of flows, coupons, principal and cost

mod schedule;
mod table;

pub use schedule::{CashFlowSchedule, CouponRates, FlowFilter, ScheduleConfig, STUB_TOLERANCE};
pub use table::{CashFlowRow, CashFlowTable};
