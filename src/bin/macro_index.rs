//! Macro Index runner
//!
//! Reads indicator observations, forecasts them, allocates across regimes
//! and writes the CSV exports.
//!
//! Usage:
//! ```text
//! macro_index --input data/indicators.csv --output-dir out
//! macro_index --config demos/basket.json --synthetic 42 --horizon 6
//! ```

use chrono::NaiveDate;
use clap::Parser;
use macro_index::export;
use macro_index::logging::init_logging;
use macro_index::store::{CsvIndicatorStore, CsvStoreConfig, IndicatorStore, SyntheticStore};
use macro_index::{FailurePolicy, Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Months of generated history per synthetic series
const SYNTHETIC_MONTHS: u32 = 120;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forecast-driven macro regime allocation")]
struct Args {
    /// JSON pipeline configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file of date,value,series_id rows
    #[arg(short, long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate a seeded synthetic basket instead of reading a file
    #[arg(long, value_name = "SEED")]
    synthetic: Option<u64>,

    /// Directory the CSV exports are written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Override the forecast horizon
    #[arg(short = 'H', long)]
    horizon: Option<usize>,

    /// Override the rolling volatility window
    #[arg(short, long)]
    window: Option<usize>,

    /// Skip indicators that cannot be forecast instead of aborting
    #[arg(long)]
    skip_failed: bool,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(window) = self.window {
            config.volatility_window = window;
        }
        if self.skip_failed {
            config.on_forecast_failure = FailurePolicy::SkipIndicator;
        }
        if let Some(path) = &self.input {
            config.source = Some(CsvStoreConfig { path: path.clone() });
        }

        config.validate()?;
        Ok(config)
    }

    fn store(
        &self,
        config: &PipelineConfig,
    ) -> Result<Box<dyn IndicatorStore>, Box<dyn std::error::Error>> {
        if let Some(seed) = self.synthetic {
            let start = NaiveDate::from_ymd_opt(2010, 1, 1).ok_or("invalid synthetic start date")?;
            info!(seed, months = SYNTHETIC_MONTHS, "using synthetic indicator basket");
            return Ok(Box::new(SyntheticStore::macro_basket(
                start,
                SYNTHETIC_MONTHS,
                seed,
            )));
        }

        let source = config
            .source
            .clone()
            .ok_or("no input: pass --input, --synthetic or set \"source\" in the config")?;
        Ok(Box::new(CsvIndicatorStore::new(source, &config.indicators)))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let config = args.pipeline_config()?;
    let store = args.store(&config)?;

    info!(
        indicators = ?config.indicator_names(),
        horizon = config.horizon,
        window = config.volatility_window,
        "starting macro index run"
    );

    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run(store.as_ref())?;

    for skipped in &output.forecasts.skipped {
        warn!(indicator = %skipped.indicator, reason = %skipped.reason, "indicator skipped");
    }

    let paths = export::export_all(&output, &args.output_dir)?;
    println!("Forecasts:  {}", paths.forecasts.display());
    println!("Weights:    {}", paths.weights.display());
    println!("Dashboard:  {}", paths.dashboard.display());

    if let Some(last) = output.allocation.rows.last() {
        println!(
            "Latest regime on {}: {} {:?}",
            last.date,
            last.allocation.regime,
            last.allocation.weights.as_array()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overrides_apply() {
        let args = Args::try_parse_from([
            "macro_index",
            "--synthetic",
            "7",
            "--horizon",
            "3",
            "--window",
            "4",
            "--skip-failed",
        ])
        .unwrap();

        let config = args.pipeline_config().unwrap();
        assert_eq!(config.horizon, 3);
        assert_eq!(config.volatility_window, 4);
        assert_eq!(config.on_forecast_failure, FailurePolicy::SkipIndicator);
        assert!(args.store(&config).is_ok());
    }

    #[test]
    fn test_input_sets_source() {
        let args = Args::try_parse_from(["macro_index", "--input", "data.csv"]).unwrap();
        let config = args.pipeline_config().unwrap();
        assert_eq!(
            config.source,
            Some(CsvStoreConfig {
                path: PathBuf::from("data.csv")
            })
        );
    }

    #[test]
    fn test_input_required_without_synthetic() {
        let args = Args::try_parse_from(["macro_index"]).unwrap();
        let config = args.pipeline_config().unwrap();
        assert!(args.store(&config).is_err());
    }

    #[test]
    fn test_input_and_synthetic_conflict() {
        let args = Args::try_parse_from(["macro_index", "--input", "a.csv", "--synthetic", "1"]);
        assert!(args.is_err());
    }

    #[test]
    fn test_synthetic_run_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "macro_index",
            "--synthetic",
            "3",
            "--output-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        let config = args.pipeline_config().unwrap();
        let store = args.store(&config).unwrap();
        let output = Pipeline::new(config).unwrap().run(store.as_ref()).unwrap();
        let paths = export::export_all(&output, &args.output_dir).unwrap();
        assert!(paths.dashboard.exists());
    }

    fn demo_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
    }

    #[test]
    fn test_demo_basket_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = demo_path("basket.json");
        let input_path = demo_path("indicators.csv");
        let args = Args::try_parse_from([
            "macro_index",
            "--config",
            config_path.to_str().unwrap(),
            "--input",
            input_path.to_str().unwrap(),
            "--output-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        let config = args.pipeline_config().unwrap();
        assert_eq!(config.on_forecast_failure, FailurePolicy::SkipIndicator);
        assert_eq!(config.horizon, 6);

        let store = args.store(&config).unwrap();
        let output = Pipeline::new(config).unwrap().run(store.as_ref()).unwrap();

        assert!(output.forecasts.skipped.is_empty());
        assert_eq!(output.forecasts.indicators(), vec!["CPI", "GDP", "Unemployment"]);
        // the missing January 2024 CPI value is not an observation
        assert_eq!(output.forecasts.get("CPI").unwrap().rows.len(), 12 + 6);
        assert!(!output.allocation.rows.is_empty());

        let paths = export::export_all(&output, &args.output_dir).unwrap();
        let weights = std::fs::read_to_string(paths.weights).unwrap();
        assert_eq!(
            weights.lines().next(),
            Some("date,regime,Equities,Bonds,Commodities,Cash")
        );
    }
}
