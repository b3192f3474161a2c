//! # Macro Index
//!
//! `macro_index` ties the workspace together: it re-exports the forecasting
//! pipeline and numeric building blocks, and sets up logging for the
//! `macro_index` binary.
//!
//! ## Example
//!
//! ```
//! use macro_index::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! assert_eq!(config.indicator_names(), vec!["CPI", "GDP", "Unemployment"]);
//! ```

pub mod logging;

pub use macro_forecast::{
    export, store, AllocationTable, FailurePolicy, ForecastError, Observation, Pipeline,
    PipelineConfig, PipelineOutput, RegimeAllocator,
};
pub use macro_math as math;

/// Environment variable selecting the log format
pub const ENV_VAR: &str = "MACRO_INDEX_ENV";

/// Deployment environment, `development` unless [`ENV_VAR`] says otherwise
pub fn get_environment() -> String {
    std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string())
}
