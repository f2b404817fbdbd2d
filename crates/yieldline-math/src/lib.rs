//! # Yieldline Math
//!
//! Numerical routines for the Yieldline fixed income valuation library.
//!
//! - **Solvers**: root finding (Newton-Raphson, Brent, hybrid)
//! - **IRR**: internal rate of return on timed cash flows
//! - **Time value**: annuities, perpetuities, interest income, level-payment
//!   loans and averages of returns
//! - **Interpolation**: linear interpolation with configurable extrapolation
//! - **Optimization**: Levenberg-Marquardt least squares for curve fitting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::float_cmp)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod interpolation;
pub mod irr;
pub mod means;
pub mod mortgage;
pub mod optimization;
pub mod solvers;
pub mod time_value;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{Extrapolation, Interpolator, LinearInterpolator};
    pub use crate::irr::{irr, npv, xirr};
    pub use crate::means::{
        arithmetic_mean, geometric_mean, harmonic_mean, weighted_geometric_mean,
        weighted_harmonic_mean,
    };
    pub use crate::mortgage::{AmortizationRow, LevelPaymentLoan};
    pub use crate::optimization::{levenberg_marquardt, FitResult, FitterConfig};
    pub use crate::solvers::{
        brent, hybrid, hybrid_numerical, newton_raphson, newton_raphson_numerical, SolverConfig,
        SolverResult,
    };
    pub use crate::time_value::{
        fisher_exact_real_rate, fisher_real_rate, future_value_annuity,
        future_value_annuity_annual, future_value_growing_annuity, future_value_two_stage_growth,
        present_value_annuity, present_value_annuity_annual, present_value_growing_annuity,
        present_value_growing_perpetuity, present_value_two_stage_annuity,
        present_value_two_stage_perpetuity, InterestBasis,
    };
}

pub use error::{MathError, MathResult};
