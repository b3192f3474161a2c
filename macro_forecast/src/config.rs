//! Pipeline configuration
//!
//! Everything that varies between indicator baskets lives here and is
//! validated once, before any data is read.

use crate::allocation::AllocationTable;
use crate::error::{ForecastError, Result};
use crate::export;
use crate::models::{ModelSpec, DEFAULT_INTERVAL_WIDTH};
use crate::store::CsvStoreConfig;
use crate::volatility::validate_window;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// An indicator of the basket and the upstream series it is read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub name: String,
    pub series_id: String,
}

impl IndicatorSpec {
    pub fn new(name: &str, series_id: &str) -> Self {
        Self {
            name: name.to_string(),
            series_id: series_id.to_string(),
        }
    }
}

/// What the pipeline does when one indicator cannot be forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run
    Abort,
    /// Log the failure and continue with the remaining indicators
    SkipIndicator,
}

fn default_interval_width() -> f64 {
    DEFAULT_INTERVAL_WIDTH
}

fn default_max_fill_periods() -> u32 {
    1
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Indicator basket, in export column order
    pub indicators: Vec<IndicatorSpec>,
    /// Future periods to forecast, in each series' own cadence
    pub horizon: usize,
    /// Observations per rolling volatility window
    pub volatility_window: usize,
    /// Has no default in files; every run states its policy
    pub on_forecast_failure: FailurePolicy,
    /// Forward fill stops once a value is this many of its own periods old
    #[serde(default = "default_max_fill_periods")]
    pub max_fill_periods: u32,
    #[serde(default)]
    pub model: ModelSpec,
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
    #[serde(default)]
    pub allocation: AllocationTable,
    /// Input file, if the run reads from CSV
    #[serde(default)]
    pub source: Option<CsvStoreConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            indicators: vec![
                IndicatorSpec::new("CPI", "CPIAUCSL"),
                IndicatorSpec::new("GDP", "GDP"),
                IndicatorSpec::new("Unemployment", "UNRATE"),
            ],
            horizon: 12,
            volatility_window: 6,
            on_forecast_failure: FailurePolicy::Abort,
            max_fill_periods: default_max_fill_periods(),
            model: ModelSpec::default(),
            interval_width: DEFAULT_INTERVAL_WIDTH,
            allocation: AllocationTable::default(),
            source: None,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option; errors name the offending setting
    pub fn validate(&self) -> Result<()> {
        if self.indicators.is_empty() {
            return Err(ForecastError::ConfigurationError(
                "At least one indicator must be configured".to_string(),
            ));
        }

        let mut names = BTreeSet::new();
        for spec in &self.indicators {
            if spec.name.trim().is_empty() || spec.series_id.trim().is_empty() {
                return Err(ForecastError::ConfigurationError(format!(
                    "Indicator name and series id must be non-empty: {:?}",
                    spec
                )));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Indicator '{}' is configured more than once",
                    spec.name
                )));
            }
        }

        let mut columns = BTreeSet::new();
        for column in export::dashboard_columns(self.indicator_names()) {
            if !columns.insert(column.clone()) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Indicator names produce the export column '{}' more than once",
                    column
                )));
            }
        }

        validate_window(self.volatility_window)?;
        self.model.build(self.interval_width)?;
        self.allocation.validate()?;

        if let Some(missing) = self
            .allocation
            .indicators()
            .into_iter()
            .find(|name| !names.contains(name))
        {
            return Err(ForecastError::ConfigurationError(format!(
                "Allocation rules read '{}', which is not a configured indicator",
                missing
            )));
        }

        Ok(())
    }

    /// Indicator names in configured order
    pub fn indicator_names(&self) -> Vec<&str> {
        self.indicators.iter().map(|spec| spec.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Weights;
    use macro_math::HoltParams;
    use rstest::rstest;

    #[rstest]
    #[case::reserved_regime("regime")]
    #[case::reserved_date("date")]
    #[case::reserved_weight("Cash")]
    #[case::suffixed_bound("CPI_lower")]
    #[case::suffixed_volatility("GDP_volatility")]
    fn test_export_column_collision_rejected(#[case] name: &str) {
        let mut config = PipelineConfig::default();
        config.indicators.push(IndicatorSpec::new(name, "EXTRA"));

        match config.validate() {
            Err(ForecastError::ConfigurationError(reason)) => assert!(reason.contains(name)),
            other => panic!("expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indicator_names(), vec!["CPI", "GDP", "Unemployment"]);
    }

    #[test]
    fn test_minimal_json() {
        let json = r#"{
            "indicators": [
                {"name": "CPI", "series_id": "CPIAUCSL"},
                {"name": "GDP", "series_id": "GDP"},
                {"name": "Unemployment", "series_id": "UNRATE"}
            ],
            "horizon": 6,
            "volatility_window": 3,
            "on_forecast_failure": "skip_indicator",
            "model": {"kind": "holt", "alpha": 0.4, "beta": 0.2}
        }"#;

        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.horizon, 6);
        assert_eq!(config.on_forecast_failure, FailurePolicy::SkipIndicator);
        assert_eq!(config.max_fill_periods, 1);
        assert_eq!(config.model, ModelSpec::Holt(HoltParams { alpha: 0.4, beta: 0.2 }));
        assert_eq!(config.allocation, AllocationTable::default());
    }

    #[test]
    fn test_failure_policy_is_required() {
        let json = r#"{
            "indicators": [{"name": "CPI", "series_id": "CPIAUCSL"}],
            "horizon": 6,
            "volatility_window": 3
        }"#;
        assert!(matches!(
            PipelineConfig::from_json_str(json),
            Err(ForecastError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = PipelineConfig::default();
        config.volatility_window = 1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.allocation.default_weights = Weights::new(0.5, 0.5, 0.5, 0.0);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.indicators.pop();
        assert!(matches!(
            config.validate(),
            Err(ForecastError::ConfigurationError(_))
        ));

        let mut config = PipelineConfig::default();
        config.indicators.push(IndicatorSpec::new("CPI", "CPILFESL"));
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.interval_width = 1.0;
        assert!(config.validate().is_err());
    }
}
