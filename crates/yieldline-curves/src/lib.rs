//! # Yieldline Curves
//!
//! Yield curves and credit spread curves for the Yieldline valuation library.
//!
//! - **Contract**: [`YieldCurve`] with discount factors, dated rates, forwards
//!   and curve comparison
//! - **Curves**: [`FlatCurve`], [`ZeroCouponCurve`], [`InterpolatedCurve`],
//!   [`SpotCurve`] and [`CombinedCurve`]
//! - **Credit**: [`CreditSpread`] with flat and term spread curves
//! - **Bootstrapping**: sequential calibration from any [`BootstrapInstrument`]
//!
//! ## Example
//!
//! ```rust
//! use yieldline_core::{Date, YieldConvention};
//! use yieldline_curves::prelude::*;
//!
//! let date = Date::from_ymd(2025, 1, 1).unwrap();
//! let curve = ZeroCouponCurve::new(date, vec![(1.0, 0.03), (5.0, 0.04)]).unwrap();
//!
//! let fwd = curve
//!     .forward_t_start_t_end(1.0, 5.0, YieldConvention::Annual, ForwardSpreads::NONE)
//!     .unwrap();
//! assert!(fwd > 0.04);
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

pub mod bootstrap;
pub mod combined;
pub mod credit;
pub mod curve;
pub mod error;
pub mod flat;
pub mod interpolated;
pub mod snapshot;
pub mod zero_coupon;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bootstrap::{BootstrapInstrument, SolvedPoints, SpotCurve};
    pub use crate::combined::CombinedCurve;
    pub use crate::credit::{CreditSpread, CreditSpreadCurve, FlatCreditSpreadCurve};
    pub use crate::curve::{CurveComparisonRow, ForwardSpreads, YieldCurve};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::flat::FlatCurve;
    pub use crate::interpolated::InterpolatedCurve;
    pub use crate::snapshot::{CurveSnapshot, SpreadSnapshot};
    pub use crate::zero_coupon::ZeroCouponCurve;
}

pub use bootstrap::{BootstrapInstrument, SolvedPoints, SpotCurve};
pub use combined::CombinedCurve;
pub use credit::{CreditSpread, CreditSpreadCurve, FlatCreditSpreadCurve};
pub use curve::{CurveComparisonRow, ForwardSpreads, YieldCurve, DEFAULT_COMPARISON_MATURITIES};
pub use error::{CurveError, CurveResult};
pub use flat::FlatCurve;
pub use interpolated::{InterpolatedCurve, DEFAULT_NODES};
pub use snapshot::{CurveSnapshot, SpreadSnapshot};
pub use zero_coupon::ZeroCouponCurve;
