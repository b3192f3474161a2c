//! Forecasting models for indicator series
//!
//! A model is an injected capability: the engine hands it the ordered
//! values of one indicator and gets back point estimates with bounds for
//! every historical position followed by the requested future steps.
//! Models never see dates; the engine owns the calendar.

use crate::error::{ForecastError, Result};
use macro_math::HoltParams;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Debug;

pub mod holt;
pub mod linear_trend;

pub use holt::HoltModel;
pub use linear_trend::LinearTrendModel;

/// Default coverage of the uncertainty band
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// Point estimates with an uncertainty band per position
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
}

impl ForecastResult {
    /// Create a result, checking that every band contains its estimate
    pub fn new_with_intervals(values: Vec<f64>, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::Math(macro_math::MathError::CalculationError(
                format!(
                    "Values length ({}) doesn't match intervals length ({})",
                    values.len(),
                    intervals.len()
                ),
            )));
        }

        for (i, (value, (lower, upper))) in values.iter().zip(intervals.iter()).enumerate() {
            if !value.is_finite() || !lower.is_finite() || !upper.is_finite() {
                return Err(ForecastError::Math(macro_math::MathError::CalculationError(
                    format!("Non-finite forecast at position {}", i),
                )));
            }
            if lower > value || value > upper {
                return Err(ForecastError::Math(macro_math::MathError::CalculationError(
                    format!(
                        "Band ({}, {}) does not contain estimate {} at position {}",
                        lower, upper, value, i
                    ),
                )));
            }
        }

        Ok(Self { values, intervals })
    }

    /// Build a result from estimates and symmetric half widths
    pub fn symmetric(values: Vec<f64>, half_widths: &[f64]) -> Result<Self> {
        let intervals = values
            .iter()
            .zip(half_widths.iter())
            .map(|(v, h)| (v - h.abs(), v + h.abs()))
            .collect();
        Self::new_with_intervals(values, intervals)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append another result, e.g. future steps after the in-sample fit
    pub fn extend(&mut self, other: ForecastResult) {
        self.values.extend(other.values);
        self.intervals.extend(other.intervals);
    }
}

/// A model fitted to one series
pub trait TrainedForecastModel: Debug {
    /// Estimates for every position of the training series
    fn fitted(&self) -> Result<ForecastResult>;

    /// Estimates for `horizon` positions after the training series
    fn forecast(&self, horizon: usize) -> Result<ForecastResult>;

    fn name(&self) -> &str;
}

/// Forecast model that can be trained on the values of one series
pub trait ForecastModel: Debug {
    /// Train the model on values in date order
    fn train(&self, values: &[f64]) -> Result<Box<dyn TrainedForecastModel>>;

    /// Fewest observations the model can be fitted on
    fn min_observations(&self) -> usize;

    fn name(&self) -> &str;

    /// Train, then return in-sample estimates followed by `horizon` future ones
    fn fit_and_predict(&self, values: &[f64], horizon: usize) -> Result<ForecastResult> {
        let trained = self.train(values)?;
        let mut result = trained.fitted()?;
        result.extend(trained.forecast(horizon)?);
        Ok(result)
    }
}

/// Model selection as it appears in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LinearTrend,
    Holt(HoltParams),
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::LinearTrend
    }
}

impl ModelSpec {
    /// Construct the configured model
    pub fn build(&self, interval_width: f64) -> Result<Box<dyn ForecastModel>> {
        match self {
            ModelSpec::LinearTrend => Ok(Box::new(LinearTrendModel::new(interval_width)?)),
            ModelSpec::Holt(params) => Ok(Box::new(HoltModel::new(*params, interval_width)?)),
        }
    }
}

/// Two-sided normal quantile for a band covering `width` of the mass
pub fn interval_z(width: f64) -> Result<f64> {
    if !(width > 0.0 && width < 1.0) {
        return Err(ForecastError::ConfigurationError(format!(
            "Interval width must be between 0 and 1, got {}",
            width
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::ConfigurationError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + width / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_interval_z() {
        assert_abs_diff_eq!(interval_z(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(interval_z(0.80).unwrap(), 1.281552, epsilon = 1e-5);
        assert!(interval_z(0.0).is_err());
        assert!(interval_z(1.0).is_err());
    }

    #[test]
    fn test_result_rejects_inverted_band() {
        let result = ForecastResult::new_with_intervals(vec![1.0], vec![(1.5, 2.0)]);
        assert!(result.is_err());

        let result = ForecastResult::new_with_intervals(vec![1.0, 2.0], vec![(0.0, 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_symmetric_and_extend() {
        let mut result = ForecastResult::symmetric(vec![1.0, 2.0], &[0.5, 0.0]).unwrap();
        let future = ForecastResult::symmetric(vec![3.0], &[1.0]).unwrap();
        result.extend(future);

        assert_eq!(result.len(), 3);
        assert_eq!(result.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(result.intervals(), &[(0.5, 1.5), (2.0, 2.0), (2.0, 4.0)]);
    }

    #[test]
    fn test_model_spec_from_json() {
        let spec: ModelSpec = serde_json::from_str(r#"{"kind":"linear_trend"}"#).unwrap();
        assert_eq!(spec, ModelSpec::LinearTrend);

        let spec: ModelSpec =
            serde_json::from_str(r#"{"kind":"holt","alpha":0.4,"beta":0.2}"#).unwrap();
        assert_eq!(spec, ModelSpec::Holt(HoltParams { alpha: 0.4, beta: 0.2 }));

        assert!(spec.build(0.8).is_ok());
        assert!(ModelSpec::LinearTrend.build(1.5).is_err());
    }
}
