//! Error types for the macro_forecast crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the macro_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The indicator store could not be read; nothing downstream runs
    #[error("Indicator store unavailable: {0}")]
    SourceUnavailable(String),

    /// Too few observations for the forecast model to fit
    #[error("Insufficient history for '{indicator}': need {required} observations, have {actual}")]
    InsufficientHistory {
        indicator: String,
        required: usize,
        actual: usize,
    },

    /// The forecast model could not produce a forecast for one indicator
    #[error("Forecast failed for '{indicator}': {reason}")]
    ForecastFailure { indicator: String, reason: String },

    /// Observations out of order or duplicated for one indicator
    #[error("Invalid history for '{indicator}': {reason}")]
    InvalidHistory { indicator: String, reason: String },

    /// The allocator was handed a snapshot without a value for an indicator
    #[error("Incomplete snapshot on {date}: no value for '{indicator}'")]
    IncompleteSnapshot { date: NaiveDate, indicator: String },

    /// Invalid configuration, detected when the configuration is loaded
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Error from the numeric building blocks
    #[error("Math error: {0}")]
    Math(#[from] macro_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

impl ForecastError {
    /// Name of the indicator the error is about, if it concerns a single one
    pub fn indicator(&self) -> Option<&str> {
        match self {
            ForecastError::InsufficientHistory { indicator, .. }
            | ForecastError::ForecastFailure { indicator, .. }
            | ForecastError::InvalidHistory { indicator, .. }
            | ForecastError::IncompleteSnapshot { indicator, .. } => Some(indicator),
            _ => None,
        }
    }
}
