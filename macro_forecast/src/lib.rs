//! # Macro Forecast
//!
//! Turns a basket of macroeconomic indicator series into a forecast-driven
//! portfolio allocation signal.
//!
//! ## Features
//!
//! - Per-indicator forecasts with uncertainty bands (linear trend or Holt smoothing)
//! - Rolling realized volatility of observed values
//! - Ordered, first-match regime rules mapping forecast levels to asset weights
//! - Bounded forward fill across indicators sampled at different cadences
//! - Flat CSV exports for dashboards
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use macro_forecast::store::SyntheticStore;
//! use macro_forecast::{export, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::new(config)?;
//!
//! let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
//! let store = SyntheticStore::macro_basket(start, 96, 42);
//!
//! let output = pipeline.run(&store)?;
//! export::export_all(&output, "out")?;
//! # Ok::<(), macro_forecast::ForecastError>(())
//! ```

pub mod allocation;
pub mod cadence;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod volatility;

// Re-export commonly used types
pub use crate::allocation::{
    AllocationTable, AllocationWeights, IndicatorSnapshot, RegimeAllocator, Weights,
};
pub use crate::cadence::Cadence;
pub use crate::config::{FailurePolicy, IndicatorSpec, PipelineConfig};
pub use crate::data::Observation;
pub use crate::engine::{ForecastEngine, ForecastPoint};
pub use crate::error::ForecastError;
pub use crate::models::{ForecastModel, ForecastResult, ModelSpec, TrainedForecastModel};
pub use crate::pipeline::{Pipeline, PipelineOutput};
pub use crate::store::IndicatorStore;
pub use crate::volatility::{rolling_volatility, VolatilityPoint};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
