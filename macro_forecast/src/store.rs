//! Indicator stores: where observations come from
//!
//! The pipeline only needs one read returning every observation. Stores
//! make no ordering promise; the pipeline sorts.

use crate::cadence::Cadence;
use crate::config::IndicatorSpec;
use crate::data::Observation;
use crate::error::{ForecastError, Result};
use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info};

/// Source of indicator observations
pub trait IndicatorStore {
    /// Read every observation. Failure here is fatal for the run.
    fn fetch_observations(&self) -> Result<Vec<Observation>>;
}

/// Observations held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    observations: Vec<Observation>,
}

impl InMemoryStore {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }
}

impl IndicatorStore for InMemoryStore {
    fn fetch_observations(&self) -> Result<Vec<Observation>> {
        Ok(self.observations.clone())
    }
}

/// Location of a CSV export of the indicator table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvStoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    value: String,
    #[serde(alias = "indicator_name")]
    series_id: String,
}

/// Reads `date,value,series_id` rows (`indicator_name` is accepted in place
/// of `series_id`). Rows are matched to configured indicators by series id
/// or by indicator name; unknown series are ignored.
#[derive(Debug, Clone)]
pub struct CsvIndicatorStore {
    config: CsvStoreConfig,
    indicators: Vec<IndicatorSpec>,
}

impl CsvIndicatorStore {
    pub fn new(config: CsvStoreConfig, indicators: &[IndicatorSpec]) -> Self {
        Self {
            config,
            indicators: indicators.to_vec(),
        }
    }

    fn indicator_for(&self, series: &str) -> Option<&str> {
        self.indicators
            .iter()
            .find(|spec| spec.series_id == series || spec.name == series)
            .map(|spec| spec.name.as_str())
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> ForecastError {
        ForecastError::SourceUnavailable(format!("{}: {}", self.config.path.display(), reason))
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time of day that follows
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl IndicatorStore for CsvIndicatorStore {
    fn fetch_observations(&self) -> Result<Vec<Observation>> {
        let file = File::open(&self.config.path).map_err(|e| self.unavailable(e))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut observations = Vec::new();
        let mut skipped_blank = 0usize;

        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| self.unavailable(e))?;

            let Some(indicator) = self.indicator_for(row.series_id.trim()) else {
                continue;
            };

            let raw_value = row.value.trim();
            // upstream marks missing observations with "." or leaves them blank
            if raw_value.is_empty() || raw_value == "." {
                skipped_blank += 1;
                continue;
            }

            let date = parse_date(&row.date).ok_or_else(|| {
                self.unavailable(format!("row {}: invalid date '{}'", line + 1, row.date))
            })?;
            let value: f64 = raw_value.parse().map_err(|_| {
                self.unavailable(format!("row {}: invalid value '{}'", line + 1, raw_value))
            })?;

            observations.push(Observation::new(indicator, date, value));
        }

        if skipped_blank > 0 {
            debug!(skipped_blank, "skipped rows without a value");
        }
        info!(
            path = %self.config.path.display(),
            observations = observations.len(),
            "loaded indicator observations"
        );

        Ok(observations)
    }
}

/// Parameters of one generated random-walk series
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub name: String,
    pub cadence: Cadence,
    pub start_value: f64,
    /// Expected change per period
    pub drift: f64,
    /// Standard deviation of the change per period
    pub volatility: f64,
}

/// Seeded random-walk series for demos and tests. The same seed always
/// yields the same observations.
///
/// Every series covers the same calendar span of `months` months from
/// `start`, each sampled at its own cadence.
#[derive(Debug, Clone)]
pub struct SyntheticStore {
    series: Vec<SyntheticSeries>,
    start: NaiveDate,
    months: u32,
    seed: u64,
}

impl SyntheticStore {
    pub fn new(series: Vec<SyntheticSeries>, start: NaiveDate, months: u32, seed: u64) -> Self {
        Self {
            series,
            start,
            months,
            seed,
        }
    }

    /// Monthly CPI inflation, quarterly GDP growth and monthly unemployment
    pub fn macro_basket(start: NaiveDate, months: u32, seed: u64) -> Self {
        let series = vec![
            SyntheticSeries {
                name: "CPI".to_string(),
                cadence: Cadence::Months(1),
                start_value: 3.0,
                drift: 0.02,
                volatility: 0.3,
            },
            SyntheticSeries {
                name: "GDP".to_string(),
                cadence: Cadence::Months(3),
                start_value: 2.5,
                drift: 0.0,
                volatility: 0.6,
            },
            SyntheticSeries {
                name: "Unemployment".to_string(),
                cadence: Cadence::Months(1),
                start_value: 5.0,
                drift: 0.01,
                volatility: 0.15,
            },
        ];
        Self::new(series, start, months, seed)
    }

    /// First date past the generated span
    pub fn end(&self) -> Option<NaiveDate> {
        self.start.checked_add_months(Months::new(self.months))
    }
}

impl IndicatorStore for SyntheticStore {
    fn fetch_observations(&self) -> Result<Vec<Observation>> {
        let out_of_range = |name: &str| {
            ForecastError::SourceUnavailable(format!(
                "synthetic '{}': dates out of range or not advancing",
                name
            ))
        };
        let end = self.end().ok_or_else(|| out_of_range("basket"))?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut observations = Vec::with_capacity(self.series.len() * self.months as usize);

        for series in &self.series {
            let shocks = Normal::new(series.drift, series.volatility).map_err(|e| {
                ForecastError::SourceUnavailable(format!("synthetic '{}': {}", series.name, e))
            })?;

            let mut value = series.start_value;
            let mut previous: Option<NaiveDate> = None;
            for k in 0.. {
                let date = series
                    .cadence
                    .advance(self.start, k)
                    .filter(|date| previous.map_or(true, |prev| *date > prev))
                    .ok_or_else(|| out_of_range(series.name.as_str()))?;
                if date >= end {
                    break;
                }
                previous = Some(date);
                observations.push(Observation::new(&series.name, date, value));
                value += shocks.sample(&mut rng);
            }
        }

        Ok(observations)
    }
}
