//! Rolling realized volatility of observed indicator values

use crate::data::Observation;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use macro_math::RollingStdDev;
use serde::{Deserialize, Serialize};

/// Trailing volatility of one indicator on one observation date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    pub indicator: String,
    pub date: NaiveDate,
    /// `None` until a full window of observations exists
    pub rolling_stdev: Option<f64>,
}

/// Reject windows too short for a sample standard deviation
pub fn validate_window(window: usize) -> Result<()> {
    if window < 2 {
        return Err(ForecastError::ConfigurationError(format!(
            "Volatility window must be at least 2, got {}",
            window
        )));
    }
    Ok(())
}

/// Sample standard deviation of the trailing `window` observed values,
/// one entry per observation. The first `window - 1` entries are `None`.
///
/// Only actual observations go in; forecast dates never get a volatility.
pub fn rolling_volatility(history: &[Observation], window: usize) -> Result<Vec<VolatilityPoint>> {
    validate_window(window)?;
    let mut rolling = RollingStdDev::new(window)?;

    Ok(history
        .iter()
        .map(|obs| VolatilityPoint {
            indicator: obs.indicator.clone(),
            date: obs.date,
            rolling_stdev: rolling.update(obs.value),
        })
        .collect())
}
