//! # Yieldline Core
//!
//! Foundational types for the Yieldline fixed income valuation library.
//!
//! - **Types**: [`Date`] with weekend-aware business day arithmetic, [`CashFlow`]
//! - **Day Count Conventions**: pluggable year-fraction calculators selected by name
//! - **Yield Conventions**: compounding bases used to quote yields and curve rates
//! - **Rate Conversions**: moving a rate between conventions through the effective annual rate
//!
//! ## Example
//!
//! ```rust
//! use yieldline_core::prelude::*;
//!
//! let dc: DayCountConvention = "actual/365".parse().unwrap();
//! let start = Date::from_ymd(2025, 1, 1).unwrap();
//! let end = Date::from_ymd(2026, 1, 1).unwrap();
//! assert_eq!(dc.fraction(start, end, None).unwrap(), 1.0);
//!
//! let bey = convert_yield(0.05, YieldConvention::Annual, YieldConvention::Bey).unwrap();
//! assert!(bey < 0.05);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_self)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_possible_truncation)]

pub mod conventions;
pub mod daycounts;
pub mod error;
pub mod rates;
pub mod rounding;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::conventions::YieldConvention;
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::rates::convert_yield;
    pub use crate::rounding::round_to;
    pub use crate::types::{CashFlow, Date};
}

// Re-export commonly used types at crate root
pub use conventions::YieldConvention;
pub use daycounts::{DayCount, DayCountConvention};
pub use error::{CoreError, CoreResult};
pub use types::{CashFlow, Date};
