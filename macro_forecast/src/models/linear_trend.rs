//! Linear trend model
//!
//! Fits a straight line through the series by least squares. Bands widen
//! with the distance past the end of the sample: `z * se * sqrt(1 + h / n)`.

use crate::error::Result;
use crate::models::{interval_z, ForecastModel, ForecastResult, TrainedForecastModel};
use macro_math::TrendFit;

/// Least squares trend model
#[derive(Debug, Clone)]
pub struct LinearTrendModel {
    /// Name of the model
    name: String,
    /// Normal quantile for the configured band width
    z: f64,
}

/// Trained linear trend model
#[derive(Debug, Clone)]
pub struct TrainedLinearTrend {
    name: String,
    z: f64,
    fit: TrendFit,
}

impl LinearTrendModel {
    /// Create a model whose bands cover `interval_width` of the residual mass
    pub fn new(interval_width: f64) -> Result<Self> {
        Ok(Self {
            name: format!("Linear Trend (interval={})", interval_width),
            z: interval_z(interval_width)?,
        })
    }
}

impl ForecastModel for LinearTrendModel {
    fn train(&self, values: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        let fit = TrendFit::fit(values)?;

        Ok(Box::new(TrainedLinearTrend {
            name: self.name.clone(),
            z: self.z,
            fit,
        }))
    }

    fn min_observations(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedLinearTrend {
    fn fitted(&self) -> Result<ForecastResult> {
        let n = self.fit.observations();
        let values: Vec<f64> = (0..n).map(|t| self.fit.value_at(t)).collect();
        let half = self.z * self.fit.residual_std_error();

        ForecastResult::symmetric(values, &vec![half; n])
    }

    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let n = self.fit.observations();
        let se = self.fit.residual_std_error();

        let values: Vec<f64> = (1..=horizon).map(|h| self.fit.value_at(n - 1 + h)).collect();
        let half_widths: Vec<f64> = (1..=horizon)
            .map(|h| self.z * se * (1.0 + h as f64 / n as f64).sqrt())
            .collect();

        ForecastResult::symmetric(values, &half_widths)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
