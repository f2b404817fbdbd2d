//! # Yieldline
//!
//! Fixed income valuation in one dependency.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`yieldline_core`]: dates, day counts, yield conventions, rate conversion
//! - [`yieldline_math`]: root finders, IRR, time value, interpolation, least squares
//! - [`yieldline_curves`]: flat, bootstrapped, fitted and credit spread curves
//! - [`yieldline_bonds`]: instruments, valuation, risk and spreads
//!
//! ## Example
//!
//! ```rust
//! use yieldline::prelude::*;
//!
//! let settle = Date::from_ymd(2025, 1, 2).unwrap();
//! let bond = FixedRateBullet::builder()
//!     .issue_date(Date::from_ymd(2023, 7, 1).unwrap())
//!     .maturity(Date::from_ymd(2030, 7, 1).unwrap())
//!     .coupon_percent(4.0)
//!     .frequency(2)
//!     .build()
//!     .unwrap();
//!
//! let request = ValuationRequest::at(settle).with_price(98.5);
//! let ytm = bond.yield_to_maturity(&request).unwrap();
//! assert!(ytm > 0.04);
//!
//! let treasuries = FlatCurve::bey(0.038, settle);
//! let z = bond.z_spread(&treasuries, &request).unwrap();
//! assert!(z > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use yieldline_bonds;
pub use yieldline_core;
pub use yieldline_curves;
pub use yieldline_math;

/// Everything needed for day-to-day valuation work.
pub mod prelude {
    pub use yieldline_bonds::prelude::*;
    pub use yieldline_core::prelude::*;
    pub use yieldline_curves::prelude::*;
    pub use yieldline_math::prelude::*;
}
