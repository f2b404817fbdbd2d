//! Bonds as curve calibration instruments.
//!
//! Quoted bonds feed the generic curve builders of `yieldline-curves`
//! through [`CalibrationBond`], which reads the settlement date and price
//! a bond stores:
//!
//! - [`bootstrap_spot_curve`]: sequential zero curve
//! - [`fit_interpolated_curve`]: least-squares node fit
//! - [`credit_spread_curve`]: spreads over a benchmark curve
//! - [`ParCurve`]: zero curve from par quotes by tenor
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use yieldline_bonds::curve_instruments::{ParCurve, ParQuote, Tenor};
//! use yieldline_core::Date;
//! use yieldline_curves::YieldCurve;
//!
//! let date = Date::from_ymd(2025, 1, 2).unwrap();
//! let quotes = BTreeMap::from([
//!     (Tenor::Years(1), ParQuote::at_par(3.0, 2)),
//!     (Tenor::Years(2), ParQuote::at_par(3.5, 2)),
//! ]);
//! let curve = ParCurve::new(date, quotes).unwrap();
//! assert!(curve.discount_t(2.0, 0.0).unwrap() < 1.0);
//! ```

mod calibration;
mod par_curve;

pub use calibration::{
    bootstrap_spot_curve, credit_spread_curve, fit_interpolated_curve, CalibrationBond,
};
pub use par_curve::{ParCurve, ParQuote, Quote, Tenor};
