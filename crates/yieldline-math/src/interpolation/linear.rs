//! Linear interpolation.

use crate::error::{MathError, MathResult};
use crate::interpolation::Interpolator;

/// Behaviour outside the range of the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Extrapolation {
    /// Out-of-range queries are an error.
    None,
    /// Hold the nearest end value.
    #[default]
    Flat,
    /// Extend the first and last segments.
    Linear,
}

/// Linear interpolation between data points.
///
/// A single point is allowed and describes a constant. Out-of-range
/// queries are flat by default.
///
/// # Example
///
/// ```rust
/// use yieldline_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::new(vec![1.0, 2.0], vec![0.03, 0.04]).unwrap();
/// assert!((interp.interpolate(1.5).unwrap() - 0.035).abs() < 1e-12);
/// assert_eq!(interp.interpolate(5.0).unwrap(), 0.04);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    extrapolation: Extrapolation,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator with flat extrapolation.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no points, if lengths differ or if the
    /// x values are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        if xs.is_empty() {
            return Err(MathError::too_few_points(1, 0));
        }
        if xs.len() != ys.len() {
            return Err(MathError::bad_argument(format!(
                "xs and ys must have same length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::bad_argument(
                "x values must be strictly increasing",
            ));
        }

        Ok(Self {
            xs,
            ys,
            extrapolation: Extrapolation::Flat,
        })
    }

    /// Creates an interpolator from `(x, y)` pairs, sorting them by x.
    pub fn from_points(points: &[(f64, f64)]) -> MathResult<Self> {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys) = sorted.into_iter().unzip();
        Self::new(xs, ys)
    }

    /// Sets the extrapolation behaviour.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Node x values.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Node y values.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Finds the index i such that xs[i] <= x < xs[i+1].
    fn find_segment(&self, x: f64) -> usize {
        let last_segment = self.xs.len() - 2;
        match self.xs.binary_search_by(|probe| probe.total_cmp(&x)) {
            Ok(i) => i.min(last_segment),
            Err(i) => i.saturating_sub(1).min(last_segment),
        }
    }

    fn check_range(&self, x: f64) -> MathResult<()> {
        if self.extrapolation == Extrapolation::None && !self.in_range(x) {
            return Err(MathError::OutsideNodes {
                x,
                min: self.min_x(),
                max: self.max_x(),
            });
        }
        Ok(())
    }

    fn is_flat_at(&self, x: f64) -> bool {
        self.xs.len() == 1 || (self.extrapolation == Extrapolation::Flat && !self.in_range(x))
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.check_range(x)?;

        if self.is_flat_at(x) {
            return Ok(if x <= self.xs[0] {
                self.ys[0]
            } else {
                self.ys[self.ys.len() - 1]
            });
        }

        let i = self.find_segment(x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);

        let t = (x - x0) / (x1 - x0);
        Ok(y0 + t * (y1 - y0))
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.check_range(x)?;

        if self.is_flat_at(x) {
            return Ok(0.0);
        }

        let i = self.find_segment(x);
        Ok((self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i]))
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_linear_interpolation() {
        let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 4.0]).unwrap();

        assert_relative_eq!(interp.interpolate(0.0).unwrap(), 0.0);
        assert_relative_eq!(interp.interpolate(1.0).unwrap(), 2.0);
        assert_relative_eq!(interp.interpolate(2.0).unwrap(), 4.0);
        assert_relative_eq!(interp.interpolate(0.5).unwrap(), 1.0);
        assert_relative_eq!(interp.interpolate(1.5).unwrap(), 3.0);
        assert_relative_eq!(interp.derivative(1.5).unwrap(), 2.0);
    }

    #[test]
    fn test_flat_extrapolation_is_default() {
        let interp = LinearInterpolator::new(vec![1.0, 2.0], vec![0.03, 0.05]).unwrap();

        assert_eq!(interp.interpolate(0.25).unwrap(), 0.03);
        assert_eq!(interp.interpolate(30.0).unwrap(), 0.05);
        assert_eq!(interp.derivative(30.0).unwrap(), 0.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0])
            .unwrap()
            .with_extrapolation(Extrapolation::Linear);

        assert_relative_eq!(interp.interpolate(-1.0).unwrap(), -1.0);
        assert_relative_eq!(interp.interpolate(3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_extrapolation_disabled() {
        let interp = LinearInterpolator::new(vec![0.0, 1.0], vec![0.0, 1.0])
            .unwrap()
            .with_extrapolation(Extrapolation::None);

        assert!(interp.interpolate(-0.5).is_err());
        assert!(interp.interpolate(1.5).is_err());
    }

    #[test]
    fn test_single_point_is_constant() {
        let interp = LinearInterpolator::new(vec![1.0], vec![0.0395]).unwrap();

        assert_eq!(interp.interpolate(0.5).unwrap(), 0.0395);
        assert_eq!(interp.interpolate(1.0).unwrap(), 0.0395);
        assert_eq!(interp.interpolate(7.0).unwrap(), 0.0395);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(LinearInterpolator::new(vec![], vec![]).is_err());
        assert!(LinearInterpolator::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(LinearInterpolator::new(vec![1.0, 1.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_from_points_sorts() {
        let interp = LinearInterpolator::from_points(&[(2.0, 4.0), (0.0, 0.0)]).unwrap();
        assert_eq!(interp.xs(), &[0.0, 2.0]);
        assert_relative_eq!(interp.interpolate(1.0).unwrap(), 2.0);
    }

    proptest! {
        #[test]
        fn prop_interpolated_value_between_neighbours(x in 0.0f64..10.0) {
            let interp = LinearInterpolator::new(
                vec![0.0, 2.0, 5.0, 10.0],
                vec![0.01, 0.03, 0.02, 0.04],
            ).unwrap();
            let y = interp.interpolate(x).unwrap();
            prop_assert!((0.01..=0.04).contains(&y));
        }
    }
}
