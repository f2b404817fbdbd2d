//! Averages of rates and returns.
//!
//! NaN entries are skipped. A weighted mean skips a pair when either the
//! value or its weight is NaN.

use crate::error::{MathError, MathResult};

/// Plain average.
///
/// # Errors
///
/// `MathError::TooFewPoints` when no value is left after skipping NaN.
pub fn arithmetic_mean(values: &[f64]) -> MathResult<f64> {
    let kept: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if kept.is_empty() {
        return Err(MathError::too_few_points(1, 0));
    }
    Ok(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// Compound average return, `(Π (1 + r))^(1/n) − 1`.
///
/// # Errors
///
/// `MathError::BadArgument` if a return is at or below −100%, and
/// `MathError::TooFewPoints` for an empty input.
///
/// # Example
///
/// ```rust
/// use yieldline_math::means::geometric_mean;
///
/// let mean = geometric_mean(&[0.10, -0.10]).unwrap();
/// assert!((mean - (1.1_f64 * 0.9).sqrt() + 1.0).abs() < 1e-12);
/// ```
pub fn geometric_mean(returns: &[f64]) -> MathResult<f64> {
    let weights = vec![1.0; returns.len()];
    weighted_geometric_mean(returns, &weights)
}

/// `n / Σ (1 / x)`.
///
/// # Errors
///
/// `MathError::BadArgument` for a value that is not positive, and
/// `MathError::TooFewPoints` for an empty input.
pub fn harmonic_mean(values: &[f64]) -> MathResult<f64> {
    let weights = vec![1.0; values.len()];
    weighted_harmonic_mean(values, &weights)
}

/// Geometric mean with weights normalized to one.
///
/// # Errors
///
/// As [`geometric_mean`], plus `MathError::BadArgument` when the lengths
/// differ.
pub fn weighted_geometric_mean(returns: &[f64], weights: &[f64]) -> MathResult<f64> {
    let pairs = paired(returns, weights)?;
    if let Some((r, _)) = pairs.iter().find(|(r, _)| 1.0 + r <= 0.0) {
        return Err(MathError::bad_argument(format!(
            "return {r} leaves no gross growth to average"
        )));
    }
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    let log_mean: f64 = pairs.iter().map(|(r, w)| w / total * r.ln_1p()).sum();
    Ok(log_mean.exp_m1())
}

/// `Σ w / Σ (w / x)`.
///
/// # Errors
///
/// As [`harmonic_mean`], plus `MathError::BadArgument` when the lengths
/// differ.
pub fn weighted_harmonic_mean(values: &[f64], weights: &[f64]) -> MathResult<f64> {
    let pairs = paired(values, weights)?;
    if let Some((x, _)) = pairs.iter().find(|(x, _)| *x <= 0.0) {
        return Err(MathError::bad_argument(format!(
            "harmonic mean needs positive values, got {x}"
        )));
    }
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    let reciprocal: f64 = pairs.iter().map(|(x, w)| w / x).sum();
    Ok(total / reciprocal)
}

fn paired(values: &[f64], weights: &[f64]) -> MathResult<Vec<(f64, f64)>> {
    if values.len() != weights.len() {
        return Err(MathError::bad_argument(format!(
            "{} values but {} weights",
            values.len(),
            weights.len()
        )));
    }
    let pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .filter(|(v, w)| !v.is_nan() && !w.is_nan())
        .map(|(&v, &w)| (v, w))
        .collect();
    if pairs.is_empty() {
        return Err(MathError::too_few_points(1, 0));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arithmetic_skips_nan() {
        let mean = arithmetic_mean(&[0.1, f64::NAN, 0.3]).unwrap();
        assert_relative_eq!(mean, 0.2, epsilon = 1e-15);
        assert!(matches!(
            arithmetic_mean(&[f64::NAN]),
            Err(MathError::TooFewPoints { .. })
        ));
    }

    #[test]
    fn test_geometric() {
        let mean = geometric_mean(&[0.1, -0.05, 0.2]).unwrap();
        assert_relative_eq!(mean, 0.07836515339093597, epsilon = 1e-12);
        assert!(geometric_mean(&[0.1, -1.0]).is_err());

        let weighted = weighted_geometric_mean(&[0.1, -0.05, 0.2], &[1.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(weighted, 0.10756620480026036, epsilon = 1e-12);
    }

    #[test]
    fn test_harmonic() {
        assert_relative_eq!(
            harmonic_mean(&[1.0, 2.0, 4.0]).unwrap(),
            12.0 / 7.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            weighted_harmonic_mean(&[1.0, 2.0, 4.0], &[1.0, 1.0, 2.0]).unwrap(),
            2.0,
            epsilon = 1e-12
        );
        assert!(harmonic_mean(&[1.0, 0.0]).is_err());
        assert!(weighted_harmonic_mean(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_means_are_ordered() {
        // harmonic <= geometric <= arithmetic on gross returns
        let gross = [1.05, 0.97, 1.12, 1.01];
        let returns: Vec<f64> = gross.iter().map(|g| g - 1.0).collect();
        let harmonic = harmonic_mean(&gross).unwrap();
        let geometric = geometric_mean(&returns).unwrap() + 1.0;
        let arithmetic = arithmetic_mean(&gross).unwrap();
        assert!(harmonic <= geometric && geometric <= arithmetic);
    }
}
