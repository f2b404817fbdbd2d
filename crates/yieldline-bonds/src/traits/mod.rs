//! Instrument traits.
//!
//! - [`FixedIncome`]: terms, schedule, valuation state and conventions of
//!   any instrument, with settlement filtering and accrued interest
//! - [`YieldInstrument`]: instruments quoted by a yield to maturity, with
//!   price/yield resolution, risk measures and spreads

mod fixed_income;
mod yield_instrument;

pub use fixed_income::FixedIncome;
pub(crate) use yield_instrument::present_value;
pub use yield_instrument::{CurveValuation, ResolvedValuation, YieldInstrument};
