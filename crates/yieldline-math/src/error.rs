//! Failures of the root finders, interpolators and curve fitter.

use thiserror::Error;

/// Result of a numerical routine.
pub type MathResult<T> = Result<T, MathError>;

/// Why a numerical routine gave up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// The iteration cap was reached before the tolerance.
    #[error("solver stopped after {iterations} iterations with residual {residual:.2e}")]
    NoConvergence {
        /// Iterations spent.
        iterations: u32,
        /// Absolute objective value at the last iterate.
        residual: f64,
    },

    /// The objective has the same sign at both ends of the search interval.
    #[error("no sign change on [{lower}, {upper}]: objective is {f_lower:.2e} and {f_upper:.2e}")]
    RootNotBracketed {
        /// Left end.
        lower: f64,
        /// Right end.
        upper: f64,
        /// Objective at `lower`.
        f_lower: f64,
        /// Objective at `upper`.
        f_upper: f64,
    },

    /// A Newton step was asked of a (near) flat objective.
    #[error("derivative {derivative:.2e} is too flat for a Newton step")]
    FlatDerivative {
        /// Derivative at the current iterate.
        derivative: f64,
    },

    /// The damped normal equations of the fitter could not be solved.
    #[error("normal equations of the fit are singular")]
    SingularSystem,

    /// A lookup outside the interpolation nodes.
    #[error("{x} lies outside the nodes [{min}, {max}]")]
    OutsideNodes {
        /// Requested abscissa.
        x: f64,
        /// First node.
        min: f64,
        /// Last node.
        max: f64,
    },

    /// Not enough points or flows to work with.
    #[error("{required} points needed, {actual} given")]
    TooFewPoints {
        /// Points the routine needs.
        required: usize,
        /// Points supplied.
        actual: usize,
    },

    /// An argument the routine cannot use.
    #[error("bad argument: {reason}")]
    BadArgument {
        /// What was wrong with it.
        reason: String,
    },
}

impl MathError {
    /// A [`MathError::NoConvergence`].
    #[must_use]
    pub fn no_convergence(iterations: u32, residual: f64) -> Self {
        Self::NoConvergence {
            iterations,
            residual,
        }
    }

    /// A [`MathError::BadArgument`].
    #[must_use]
    pub fn bad_argument(reason: impl Into<String>) -> Self {
        Self::BadArgument {
            reason: reason.into(),
        }
    }

    /// A [`MathError::TooFewPoints`].
    #[must_use]
    pub fn too_few_points(required: usize, actual: usize) -> Self {
        Self::TooFewPoints { required, actual }
    }
}
