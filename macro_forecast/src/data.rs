//! Indicator observations and history preparation

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observed value of a named macro indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Indicator name, e.g. "CPI"
    pub indicator: String,
    /// Observation date
    pub date: NaiveDate,
    /// Observed value
    pub value: f64,
}

impl Observation {
    pub fn new(indicator: impl Into<String>, date: NaiveDate, value: f64) -> Self {
        Self {
            indicator: indicator.into(),
            date,
            value,
        }
    }
}

/// Split a flat list of observations into one list per indicator.
/// Lists keep the input order; use [`prepare_history`] to sort them.
pub fn group_by_indicator(observations: Vec<Observation>) -> BTreeMap<String, Vec<Observation>> {
    let mut grouped: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        grouped.entry(obs.indicator.clone()).or_default().push(obs);
    }
    grouped
}

/// Sort one indicator's observations by date and reject duplicate dates
pub fn prepare_history(indicator: &str, mut history: Vec<Observation>) -> Result<Vec<Observation>> {
    history.sort_by_key(|obs| obs.date);
    validate_history(indicator, &history)?;
    Ok(history)
}

/// Check that a history is strictly increasing in date
pub fn validate_history(indicator: &str, history: &[Observation]) -> Result<()> {
    for pair in history.windows(2) {
        if pair[1].date == pair[0].date {
            return Err(ForecastError::InvalidHistory {
                indicator: indicator.to_string(),
                reason: format!("duplicate observation on {}", pair[1].date),
            });
        }
        if pair[1].date < pair[0].date {
            return Err(ForecastError::InvalidHistory {
                indicator: indicator.to_string(),
                reason: format!("{} follows {}", pair[1].date, pair[0].date),
            });
        }
    }
    Ok(())
}

/// Values of a history in date order
pub fn values(history: &[Observation]) -> Vec<f64> {
    history.iter().map(|obs| obs.value).collect()
}

/// Dates of a history in date order
pub fn dates(history: &[Observation]) -> Vec<NaiveDate> {
    history.iter().map(|obs| obs.date).collect()
}
