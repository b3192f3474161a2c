//! Holt double exponential smoothing
//!
//! Tracks a level and a trend. The first value seeds the level, the second
//! seeds the trend as the first difference, later values update both.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Smoothing factors for level (`alpha`) and trend (`beta`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltParams {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for HoltParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
        }
    }
}

impl HoltParams {
    /// Both factors must lie strictly between 0 and 1
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(MathError::InvalidInput(
                "Alpha must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(MathError::InvalidInput(
                "Beta must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Streaming Holt smoother
#[derive(Debug, Clone)]
pub struct HoltSmoother {
    params: HoltParams,
    level: Option<f64>,
    trend: Option<f64>,
    values_seen: usize,
}

impl HoltSmoother {
    pub fn new(params: HoltParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            level: None,
            trend: None,
            values_seen: 0,
        })
    }

    /// Feed the next observation
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot smooth non-finite value {}",
                value
            )));
        }
        self.values_seen += 1;

        match (self.level, self.trend) {
            (None, _) => {
                self.level = Some(value);
            }
            (Some(prev_level), None) => {
                self.level = Some(value);
                self.trend = Some(value - prev_level);
            }
            (Some(prev_level), Some(prev_trend)) => {
                let alpha = self.params.alpha;
                let beta = self.params.beta;
                let new_level = alpha * value + (1.0 - alpha) * (prev_level + prev_trend);
                let new_trend = beta * (new_level - prev_level) + (1.0 - beta) * prev_trend;

                self.level = Some(new_level);
                self.trend = Some(new_trend);
            }
        }

        Ok(())
    }

    /// Forecast `h` steps past the last update
    pub fn forecast(&self, h: usize) -> Result<f64> {
        match self.level {
            Some(level) => Ok(level + h as f64 * self.trend.unwrap_or(0.0)),
            None => Err(MathError::InsufficientData(
                "Not enough data to make a forecast".to_string(),
            )),
        }
    }

    pub fn level(&self) -> Result<f64> {
        self.level.ok_or_else(|| {
            MathError::InsufficientData("Level not calculated yet".to_string())
        })
    }

    /// Current trend; zero until two values have been seen
    pub fn trend(&self) -> f64 {
        self.trend.unwrap_or(0.0)
    }

    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    pub fn params(&self) -> HoltParams {
        self.params
    }
}
