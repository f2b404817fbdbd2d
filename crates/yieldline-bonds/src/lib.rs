//! # Yieldline Bonds
//!
//! Bond, floating-rate note and money-market valuation for the Yieldline
//! valuation library.
//!
//! This crate provides:
//!
//! - **Instruments**: fixed-rate bullets, custom-flow (amortizing) bonds,
//!   money-market instruments and floating-rate notes
//! - **Valuation**: price and yield resolution with per-call convention
//!   overrides, accrued interest, clean and dirty prices
//! - **Risk**: analytic and effective duration, convexity and DV01
//! - **Spreads**: G-, I- and Z-spreads and discount margins
//! - **Curves**: quoted bonds as calibration instruments and par curves
//!
//! ## Example
//!
//! ```rust
//! use yieldline_bonds::prelude::*;
//! use yieldline_core::{Date, YieldConvention};
//!
//! let bond = FixedRateBullet::builder()
//!     .issue_date(Date::from_ymd(2020, 1, 1).unwrap())
//!     .maturity(Date::from_ymd(2025, 1, 1).unwrap())
//!     .coupon_percent(5.0)
//!     .frequency(1)
//!     .notional(1000.0)
//!     .yield_convention(YieldConvention::Annual)
//!     .build()
//!     .unwrap();
//!
//! let request = ValuationRequest::new().with_price(950.0);
//! let ytm = bond.yield_to_maturity(&request).unwrap();
//! assert!((ytm - 0.0619).abs() < 1e-3);
//!
//! let duration = bond.modified_duration(&request).unwrap();
//! assert!(duration > 4.2 && duration < 4.3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::float_cmp)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::too_many_arguments)]

pub mod cashflows;
pub mod conventions;
pub mod curve_instruments;
pub mod error;
pub mod instruments;
pub mod pricing;
pub mod risk;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    // Cash flows
    pub use crate::cashflows::{
        CashFlowRow, CashFlowSchedule, CashFlowTable, CouponRates, ScheduleConfig,
    };

    // Conventions
    pub use crate::conventions::{
        ConventionResolver, InstrumentFamily, ResolvedConventions, ValuationOverrides,
    };

    // Curve instruments
    pub use crate::curve_instruments::{CalibrationBond, ParCurve, ParQuote, Quote, Tenor};

    // Errors
    pub use crate::error::{BondError, BondResult};

    // Instruments
    pub use crate::instruments::{
        CustomFlowBond, CustomFlowBondBuilder, FixedRateBullet, FixedRateBulletBuilder,
        FloatingRateNote, FloatingRateNoteBuilder, FrnValuation, MoneyMarketBuilder,
        MoneyMarketInstrument, MoneyMarketKind, ReferenceInputs,
    };

    // Risk
    pub use crate::risk::{AnalyticRisk, BumpSizes};

    // Traits
    pub use crate::traits::{CurveValuation, FixedIncome, ResolvedValuation, YieldInstrument};

    // Types
    pub use crate::types::{InstrumentTerms, QuoteSource, ValuationRequest, ValuationState};
}

pub use error::{BondError, BondResult};
pub use instruments::{
    CustomFlowBond, CustomFlowBondBuilder, FixedRateBullet, FixedRateBulletBuilder,
    FloatingRateNote, FloatingRateNoteBuilder, MoneyMarketBuilder, MoneyMarketInstrument,
    MoneyMarketKind,
};
pub use traits::{FixedIncome, YieldInstrument};
pub use types::ValuationRequest;
