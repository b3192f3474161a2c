//! Pipeline orchestration
//!
//! Phase one forecasts every configured indicator, computes its rolling
//! volatility and joins the two by date into a long table. Phase two pivots
//! the point estimates into one snapshot per date, allocates, and merges the
//! weights back with the forecasts into flat export rows.
//!
//! Gap smoothing happens in exactly one place: when an indicator has no
//! forecast on a date, its most recent earlier forecast is carried forward,
//! but only while that value is younger than `max_fill_periods` of the
//! indicator's own cadence. A carried value has no volatility. Dates that
//! still lack a value are dropped and reported, never zero-filled.

use crate::allocation::{AllocationWeights, IndicatorSnapshot, RegimeAllocator};
use crate::cadence::Cadence;
use crate::config::{FailurePolicy, PipelineConfig};
use crate::data::{self, Observation};
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::models::ForecastModel;
use crate::store::IndicatorStore;
use crate::volatility::rolling_volatility;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// One row of the long forecast table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub indicator: String,
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub actual: Option<f64>,
    /// Undefined for the first `window - 1` observations and all future dates
    pub rolling_volatility: Option<f64>,
    pub is_future: bool,
}

/// Forecast rows of one indicator, in date order
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorForecast {
    pub indicator: String,
    pub cadence: Option<Cadence>,
    pub rows: Vec<ForecastRow>,
}

/// An indicator left out of the run and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedIndicator {
    pub indicator: String,
    pub reason: String,
}

/// Output of phase one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    /// In configured indicator order
    pub series: Vec<IndicatorForecast>,
    pub skipped: Vec<SkippedIndicator>,
}

impl ForecastTable {
    /// All rows in long format, indicator by indicator
    pub fn rows(&self) -> impl Iterator<Item = &ForecastRow> {
        self.series.iter().flat_map(|s| s.rows.iter())
    }

    pub fn indicators(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.indicator.as_str()).collect()
    }

    pub fn get(&self, indicator: &str) -> Option<&IndicatorForecast> {
        self.series.iter().find(|s| s.indicator == indicator)
    }
}

/// An indicator's forecast as it appears on one export row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub volatility: Option<f64>,
    /// True when carried forward from an earlier date
    pub filled: bool,
}

/// One fully populated row of the flat export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub date: NaiveDate,
    /// Aligned with [`AllocationOutput::indicators`]
    pub values: Vec<IndicatorValue>,
    pub allocation: AllocationWeights,
}

/// A date left out of the export and why
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedDate {
    pub date: NaiveDate,
    pub reason: String,
}

/// Output of phase two
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationOutput {
    pub indicators: Vec<String>,
    pub rows: Vec<ExportRow>,
    pub dropped: Vec<DroppedDate>,
}

impl AllocationOutput {
    pub fn weights(&self) -> impl Iterator<Item = &AllocationWeights> {
        self.rows.iter().map(|row| &row.allocation)
    }

    pub fn row(&self, date: NaiveDate) -> Option<&ExportRow> {
        self.rows.iter().find(|row| row.date == date)
    }
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub forecasts: ForecastTable,
    pub allocation: AllocationOutput,
}

/// Forecast, allocate and merge for a configured indicator basket
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    engine: ForecastEngine,
    allocator: RegimeAllocator,
}

impl Pipeline {
    /// Build a pipeline with the configured forecast model
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model = config.model.build(config.interval_width)?;
        Self::with_model(config, model)
    }

    /// Build a pipeline around an injected forecast model
    pub fn with_model(config: PipelineConfig, model: Box<dyn ForecastModel>) -> Result<Self> {
        config.validate()?;
        let allocator = RegimeAllocator::new(config.allocation.clone())?;

        Ok(Self {
            config,
            engine: ForecastEngine::new(model),
            allocator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn allocator(&self) -> &RegimeAllocator {
        &self.allocator
    }

    /// Read the store and run both phases
    pub fn run(&self, store: &dyn IndicatorStore) -> Result<PipelineOutput> {
        let observations = store.fetch_observations().map_err(|err| match err {
            ForecastError::SourceUnavailable(_) => err,
            other => ForecastError::SourceUnavailable(other.to_string()),
        })?;
        info!(observations = observations.len(), "read indicator store");

        let forecasts = self.forecast_all(observations)?;
        let allocation = self.allocate(&forecasts)?;

        Ok(PipelineOutput {
            forecasts,
            allocation,
        })
    }

    /// Phase one: forecast and volatility for every configured indicator
    pub fn forecast_all(&self, observations: Vec<Observation>) -> Result<ForecastTable> {
        let mut grouped = data::group_by_indicator(observations);
        let mut table = ForecastTable::default();

        for spec in &self.config.indicators {
            let history = grouped.remove(&spec.name).unwrap_or_default();

            match self.forecast_indicator(&spec.name, history) {
                Ok(forecast) => {
                    info!(
                        indicator = %spec.name,
                        rows = forecast.rows.len(),
                        "indicator forecast ready"
                    );
                    table.series.push(forecast);
                }
                Err(err) if err.indicator().is_some() => match self.config.on_forecast_failure {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::SkipIndicator => {
                        warn!(indicator = %spec.name, error = %err, "skipping indicator");
                        table.skipped.push(SkippedIndicator {
                            indicator: spec.name.clone(),
                            reason: err.to_string(),
                        });
                    }
                },
                Err(err) => return Err(err),
            }
        }

        for unused in grouped.keys() {
            debug!(indicator = %unused, "ignoring observations of unconfigured indicator");
        }

        let required = self.allocator.required_indicators();
        for skipped in &table.skipped {
            if required.contains(&skipped.indicator) {
                warn!(
                    indicator = %skipped.indicator,
                    "allocation rules need a skipped indicator; affected dates will be dropped"
                );
            }
        }

        Ok(table)
    }

    /// Forecast one indicator and left-join its volatility by date
    pub fn forecast_indicator(
        &self,
        indicator: &str,
        history: Vec<Observation>,
    ) -> Result<IndicatorForecast> {
        let history = data::prepare_history(indicator, history)?;

        let points = self
            .engine
            .forecast(indicator, &history, self.config.horizon)?;
        let volatility = rolling_volatility(&history, self.config.volatility_window)?;

        if points.is_empty() || points.windows(2).any(|pair| pair[0].date >= pair[1].date) {
            return Err(ForecastError::ForecastFailure {
                indicator: indicator.to_string(),
                reason: "forecast output is empty or not in date order".to_string(),
            });
        }

        let by_date: BTreeMap<NaiveDate, Option<f64>> = volatility
            .into_iter()
            .map(|point| (point.date, point.rolling_stdev))
            .collect();

        let rows = points
            .into_iter()
            .map(|point| ForecastRow {
                rolling_volatility: by_date.get(&point.date).copied().flatten(),
                indicator: point.indicator,
                date: point.date,
                point: point.point,
                lower: point.lower,
                upper: point.upper,
                actual: point.actual,
                is_future: point.is_future,
            })
            .collect();

        Ok(IndicatorForecast {
            indicator: indicator.to_string(),
            cadence: Cadence::infer(&data::dates(&history)),
            rows,
        })
    }

    /// Phase two: per-date snapshots, allocation and merge
    pub fn allocate(&self, table: &ForecastTable) -> Result<AllocationOutput> {
        let dates: BTreeSet<NaiveDate> = table.rows().map(|row| row.date).collect();
        let by_date: Vec<BTreeMap<NaiveDate, &ForecastRow>> = table
            .series
            .iter()
            .map(|series| series.rows.iter().map(|row| (row.date, row)).collect())
            .collect();

        let mut output = AllocationOutput {
            indicators: table.series.iter().map(|s| s.indicator.clone()).collect(),
            ..AllocationOutput::default()
        };

        'dates: for date in dates {
            let mut snapshot = IndicatorSnapshot::new(date);
            for spec in &self.config.indicators {
                snapshot.set(&spec.name, None);
            }

            let mut values = Vec::with_capacity(table.series.len());
            for (series, rows) in table.series.iter().zip(&by_date) {
                match self.value_on(series, rows, date) {
                    Some(value) => {
                        snapshot.set(&series.indicator, Some(value.point));
                        values.push(value);
                    }
                    None => {
                        let reason = format!(
                            "no forecast for '{}' within the fill bound",
                            series.indicator
                        );
                        debug!(%date, %reason, "dropping date");
                        output.dropped.push(DroppedDate { date, reason });
                        continue 'dates;
                    }
                }
            }

            match self.allocator.allocate(&snapshot) {
                Ok(allocation) => output.rows.push(ExportRow {
                    date,
                    values,
                    allocation,
                }),
                Err(err @ ForecastError::IncompleteSnapshot { .. }) => {
                    debug!(%date, error = %err, "dropping date");
                    output.dropped.push(DroppedDate {
                        date,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if !output.dropped.is_empty() {
            warn!(
                dropped = output.dropped.len(),
                first = %output.dropped[0].date,
                "dates without a complete snapshot were left out of the export"
            );
        }
        info!(rows = output.rows.len(), "allocation complete");

        Ok(output)
    }

    /// The indicator's forecast on `date`, carried forward within the fill bound
    fn value_on(
        &self,
        series: &IndicatorForecast,
        rows: &BTreeMap<NaiveDate, &ForecastRow>,
        date: NaiveDate,
    ) -> Option<IndicatorValue> {
        if let Some(row) = rows.get(&date) {
            return Some(IndicatorValue {
                point: row.point,
                lower: row.lower,
                upper: row.upper,
                volatility: row.rolling_volatility,
                filled: false,
            });
        }

        let (source_date, row) = rows.range(..date).next_back()?;
        let stale_at = series
            .cadence?
            .advance(*source_date, self.config.max_fill_periods)?;
        if date >= stale_at {
            return None;
        }

        debug!(indicator = %series.indicator, %date, from = %source_date, "forward filled");
        Some(IndicatorValue {
            point: row.point,
            lower: row.lower,
            upper: row.upper,
            volatility: None,
            filled: true,
        })
    }
}
