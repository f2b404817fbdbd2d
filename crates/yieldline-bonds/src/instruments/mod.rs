//! Instrument types.
//!
//! - [`FixedRateBullet`]: fixed coupons, notional repaid at maturity
//! - [`CustomFlowBond`]: explicit amortization and coupon schedules
//! - [`MoneyMarketInstrument`]: single-payment bills, CDs, CP and BAs
//! - [`FloatingRateNote`]: reference rate plus a quoted margin

mod custom_flow;
mod fixed_rate;
mod floating_rate;
mod money_market;

pub use custom_flow::{CustomFlowBond, CustomFlowBondBuilder};
pub use fixed_rate::{FixedRateBullet, FixedRateBulletBuilder};
pub use floating_rate::{
    FloatingRateNote, FloatingRateNoteBuilder, FrnValuation, ReferenceInputs,
};
pub use money_market::{
    MoneyMarketBuilder, MoneyMarketInstrument, MoneyMarketKind, MoneyMarketTiming,
};
