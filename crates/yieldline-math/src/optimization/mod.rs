//! Nonlinear least squares.
//!
//! [`levenberg_marquardt`] minimizes `Σ r_i(x)²` for a caller-supplied
//! residual vector. It is used to fit curve node rates so that every
//! calibration bond reprices to its quoted price.

use nalgebra::{DMatrix, DVector};

use crate::error::MathError;

/// Configuration for the Levenberg-Marquardt fitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitterConfig {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Tolerance for convergence (RMS residual threshold).
    pub tolerance: f64,
    /// Initial Levenberg-Marquardt damping parameter.
    pub initial_lambda: f64,
    /// Lambda adjustment factor.
    pub lambda_factor: f64,
    /// Minimum lambda value.
    pub min_lambda: f64,
    /// Maximum lambda value.
    pub max_lambda: f64,
    /// Finite difference step for the Jacobian.
    pub jacobian_step: f64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            initial_lambda: 0.001,
            lambda_factor: 10.0,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            jacobian_step: 1e-6,
        }
    }
}

impl FitterConfig {
    /// Creates a new configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the Jacobian finite difference step.
    #[must_use]
    pub fn with_jacobian_step(mut self, jacobian_step: f64) -> Self {
        self.jacobian_step = jacobian_step;
        self
    }
}

/// Outcome of a least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Fitted parameters.
    pub parameters: Vec<f64>,
    /// Residuals at the fitted parameters.
    pub residuals: Vec<f64>,
    /// Number of iterations used.
    pub iterations: usize,
    /// Final RMS residual.
    pub rms_error: f64,
    /// Whether the RMS residual fell below the tolerance.
    pub converged: bool,
}

impl FitResult {
    /// Returns the maximum absolute residual.
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.residuals.iter().map(|r| r.abs()).fold(0.0, f64::max)
    }

    /// One-line description of the fit.
    pub fn summary(&self) -> String {
        format!(
            "Fit {}: {} iterations, RMS={:.3e}, Max={:.3e}",
            if self.converged { "converged" } else { "FAILED" },
            self.iterations,
            self.rms_error,
            self.max_error()
        )
    }
}

fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Damped Gauss-Newton minimization of `Σ r_i(x)²`.
///
/// Each iteration builds a central-difference Jacobian `J`, solves
/// `(JᵀJ + λI) δ = −Jᵀr` by LU decomposition and accepts the step only if
/// the sum of squares decreases. Accepted steps shrink λ by
/// `lambda_factor`, rejected steps grow it.
///
/// The residual closure may fail with the caller's error type; any error
/// aborts the fit.
///
/// # Example
///
/// ```rust
/// use yieldline_math::error::MathError;
/// use yieldline_math::optimization::{levenberg_marquardt, FitterConfig};
///
/// // Fit y = a·x + b through three points
/// let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
/// let fit = levenberg_marquardt(
///     |p: &[f64]| Ok::<_, MathError>(points.iter().map(|(x, y)| p[0] * x + p[1] - y).collect()),
///     &[0.0, 0.0],
///     &FitterConfig::default(),
/// )
/// .unwrap();
/// assert!((fit.parameters[0] - 2.0).abs() < 1e-6);
/// assert!((fit.parameters[1] - 1.0).abs() < 1e-6);
/// ```
pub fn levenberg_marquardt<F, E>(
    mut residuals: F,
    initial: &[f64],
    config: &FitterConfig,
) -> Result<FitResult, E>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
    E: From<MathError>,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::too_few_points(1, 0).into());
    }

    let mut params = initial.to_vec();
    let mut current = residuals(&params)?;
    let m = current.len();
    if m == 0 {
        return Err(MathError::too_few_points(1, 0).into());
    }

    let mut error = sum_of_squares(&current);
    let mut lambda = config.initial_lambda;
    let h = config.jacobian_step;

    for iteration in 0..config.max_iterations {
        let rms = (error / m as f64).sqrt();
        tracing::trace!(iteration, rms, lambda, "levenberg-marquardt step");

        if rms < config.tolerance {
            tracing::debug!(iterations = iteration, rms, "fit converged");
            return Ok(FitResult {
                parameters: params,
                residuals: current,
                iterations: iteration,
                rms_error: rms,
                converged: true,
            });
        }

        let mut jacobian = DMatrix::<f64>::zeros(m, n);
        for j in 0..n {
            let mut up = params.clone();
            up[j] += h;
            let mut down = params.clone();
            down[j] -= h;
            let r_up = residuals(&up)?;
            let r_down = residuals(&down)?;
            for i in 0..m {
                jacobian[(i, j)] = (r_up[i] - r_down[i]) / (2.0 * h);
            }
        }

        let r = DVector::from_column_slice(&current);
        let jt = jacobian.transpose();
        let jtj = &jt * &jacobian;
        let rhs = -(&jt * &r);

        let damped = jtj + DMatrix::<f64>::identity(n, n) * lambda;
        let Some(delta) = damped.lu().solve(&rhs) else {
            if lambda >= config.max_lambda {
                return Err(MathError::SingularSystem.into());
            }
            lambda = (lambda * config.lambda_factor).min(config.max_lambda);
            continue;
        };

        let candidate: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
        let candidate_residuals = residuals(&candidate)?;
        let candidate_error = sum_of_squares(&candidate_residuals);

        if candidate_error.is_finite() && candidate_error < error {
            params = candidate;
            current = candidate_residuals;
            error = candidate_error;
            lambda = (lambda / config.lambda_factor).max(config.min_lambda);
        } else if lambda >= config.max_lambda {
            break;
        } else {
            lambda = (lambda * config.lambda_factor).min(config.max_lambda);
        }
    }

    let rms = (error / m as f64).sqrt();
    let converged = rms < config.tolerance;
    if !converged {
        tracing::warn!(rms, tolerance = config.tolerance, "fit did not reach tolerance");
    }
    Ok(FitResult {
        parameters: params,
        residuals: current,
        iterations: config.max_iterations,
        rms_error: rms,
        converged,
    })
}
