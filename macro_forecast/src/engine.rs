//! Forecast engine: runs a model over one indicator's dated history

use crate::cadence::Cadence;
use crate::data::{self, Observation};
use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use chrono::NaiveDate;
use macro_math::MathError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Forecast for one indicator on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub indicator: String,
    pub date: NaiveDate,
    /// Point estimate
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    /// Observed value, present for historical dates only
    pub actual: Option<f64>,
    /// True for dates after the last observation
    pub is_future: bool,
}

/// Runs the injected forecast model and attaches dates to its output
#[derive(Debug)]
pub struct ForecastEngine {
    model: Box<dyn ForecastModel>,
}

impl ForecastEngine {
    pub fn new(model: Box<dyn ForecastModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn ForecastModel {
        self.model.as_ref()
    }

    /// Forecast over every historical date plus `horizon` future dates at
    /// the series' own cadence.
    ///
    /// `history` must be sorted by date without duplicates and hold at
    /// least [`ForecastModel::min_observations`] values.
    pub fn forecast(
        &self,
        indicator: &str,
        history: &[Observation],
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        data::validate_history(indicator, history)?;

        let required = self.model.min_observations();
        if history.len() < required {
            return Err(ForecastError::InsufficientHistory {
                indicator: indicator.to_string(),
                required,
                actual: history.len(),
            });
        }

        let dates = data::dates(history);
        let values = data::values(history);

        let future_dates = match (horizon, dates.last()) {
            (0, _) => Vec::new(),
            (_, Some(&last)) => Cadence::infer(&dates)
                .and_then(|cadence| cadence.future_dates(last, horizon))
                .ok_or_else(|| ForecastError::ForecastFailure {
                    indicator: indicator.to_string(),
                    reason: "cannot determine the series cadence".to_string(),
                })?,
            (_, None) => Vec::new(),
        };

        let result = self
            .model
            .fit_and_predict(&values, horizon)
            .map_err(|err| match err {
                ForecastError::Math(MathError::InsufficientData(_)) => {
                    ForecastError::InsufficientHistory {
                        indicator: indicator.to_string(),
                        required,
                        actual: history.len(),
                    }
                }
                other => ForecastError::ForecastFailure {
                    indicator: indicator.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let expected = history.len() + future_dates.len();
        if result.is_empty() || result.len() != expected {
            return Err(ForecastError::ForecastFailure {
                indicator: indicator.to_string(),
                reason: format!(
                    "model '{}' returned {} points, expected {}",
                    self.model.name(),
                    result.len(),
                    expected
                ),
            });
        }

        let actuals = values.iter().map(|v| Some(*v));
        let futures = std::iter::repeat(None).take(future_dates.len());

        let points: Vec<ForecastPoint> = dates
            .iter()
            .chain(future_dates.iter())
            .zip(actuals.chain(futures))
            .zip(result.values().iter().zip(result.intervals()))
            .map(|((date, actual), (point, (lower, upper)))| ForecastPoint {
                indicator: indicator.to_string(),
                date: *date,
                point: *point,
                lower: *lower,
                upper: *upper,
                actual,
                is_future: actual.is_none(),
            })
            .collect();

        debug!(
            indicator,
            model = self.model.name(),
            historical = history.len(),
            horizon,
            "forecast complete"
        );

        Ok(points)
    }
}
