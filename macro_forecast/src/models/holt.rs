//! Holt double exponential smoothing model

use crate::error::Result;
use crate::models::{interval_z, ForecastModel, ForecastResult, TrainedForecastModel};
use macro_math::{HoltParams, HoltSmoother};

/// Holt linear-trend smoothing model
#[derive(Debug, Clone)]
pub struct HoltModel {
    /// Name of the model
    name: String,
    /// Smoothing parameters
    params: HoltParams,
    /// Normal quantile for the configured band width
    z: f64,
}

/// Trained Holt model
#[derive(Debug, Clone)]
pub struct TrainedHolt {
    name: String,
    z: f64,
    /// State after the last observation
    smoother: HoltSmoother,
    /// One-step-ahead predictions over the training series
    in_sample: Vec<f64>,
    /// Root mean squared one-step error
    sigma: f64,
}

impl HoltModel {
    pub fn new(params: HoltParams, interval_width: f64) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            name: format!("Holt (alpha={}, beta={})", params.alpha, params.beta),
            params,
            z: interval_z(interval_width)?,
        })
    }
}

impl ForecastModel for HoltModel {
    fn train(&self, values: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        macro_math::ensure_finite(values)?;
        if values.len() < self.min_observations() {
            return Err(macro_math::MathError::InsufficientData(format!(
                "Holt smoothing needs at least {} values, have {}",
                self.min_observations(),
                values.len()
            ))
            .into());
        }

        let mut smoother = HoltSmoother::new(self.params)?;
        let mut in_sample = Vec::with_capacity(values.len());

        // The first value has no prior state, so it predicts itself
        in_sample.push(values[0]);
        smoother.update(values[0])?;

        for &value in &values[1..] {
            in_sample.push(smoother.forecast(1)?);
            smoother.update(value)?;
        }

        let squared_errors: f64 = values[1..]
            .iter()
            .zip(&in_sample[1..])
            .map(|(actual, predicted)| (actual - predicted).powi(2))
            .sum();
        let sigma = (squared_errors / (values.len() - 1) as f64).sqrt();

        Ok(Box::new(TrainedHolt {
            name: self.name.clone(),
            z: self.z,
            smoother,
            in_sample,
            sigma,
        }))
    }

    fn min_observations(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedHolt {
    fn fitted(&self) -> Result<ForecastResult> {
        let half = self.z * self.sigma;
        ForecastResult::symmetric(self.in_sample.clone(), &vec![half; self.in_sample.len()])
    }

    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let mut values = Vec::with_capacity(horizon);
        let mut half_widths = Vec::with_capacity(horizon);

        for h in 1..=horizon {
            values.push(self.smoother.forecast(h)?);
            half_widths.push(self.z * self.sigma * (h as f64).sqrt());
        }

        ForecastResult::symmetric(values, &half_widths)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
