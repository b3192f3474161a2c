//! # Macro Math
//!
//! Numeric building blocks for macro indicator forecasting.
//! This crate provides the small pieces of arithmetic the forecasting
//! pipeline is assembled from:
//! - Ordinary least squares trend fitting
//! - Holt double exponential smoothing
//! - Rolling sample standard deviation

use thiserror::Error;

pub mod rolling;
pub mod smoothing;
pub mod trend;

pub use rolling::{sample_std_dev, RollingStdDev};
pub use smoothing::{HoltParams, HoltSmoother};
pub use trend::TrendFit;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Reject NaN and infinite values before they poison a fit
pub fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(MathError::InvalidInput(format!(
            "Non-finite value {} at position {}",
            values[idx], idx
        ))),
        None => Ok(()),
    }
}
