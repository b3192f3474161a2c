//! Linear trend fitting
//!
//! Fits `y = intercept + slope * t` over the observation index `t = 0..n`
//! by ordinary least squares. The index, not the calendar date, is the
//! regressor, so a series is assumed to be evenly sampled.

use crate::{ensure_finite, MathError, Result};

/// A fitted linear trend
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    slope: f64,
    intercept: f64,
    residual_std_error: f64,
    observations: usize,
}

impl TrendFit {
    /// Fit a trend line to the values. Needs at least 3 points so the
    /// residual standard error has a positive number of degrees of freedom.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 3 {
            return Err(MathError::InsufficientData(format!(
                "Trend fit needs at least 3 values, have {}",
                values.len()
            )));
        }
        ensure_finite(values)?;

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            numerator += dx * (y - y_mean);
            denominator += dx * dx;
        }

        if denominator.abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        let ss_residual: f64 = values
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - (intercept + slope * i as f64)).powi(2))
            .sum();
        let residual_std_error = (ss_residual / (n - 2.0)).sqrt();

        if !slope.is_finite() || !intercept.is_finite() || !residual_std_error.is_finite() {
            return Err(MathError::CalculationError(
                "Trend fit produced non-finite parameters".to_string(),
            ));
        }

        Ok(Self {
            slope,
            intercept,
            residual_std_error,
            observations: values.len(),
        })
    }

    /// Value of the trend line at index `t` (may lie beyond the fitted range)
    pub fn value_at(&self, t: usize) -> f64 {
        self.intercept + self.slope * t as f64
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Residual standard error with `n - 2` degrees of freedom
    pub fn residual_std_error(&self) -> f64 {
        self.residual_std_error
    }

    /// Number of values the trend was fitted on
    pub fn observations(&self) -> usize {
        self.observations
    }
}
