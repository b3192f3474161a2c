//! Regime-based asset allocation
//!
//! An ordered table of `(conditions, weights)` rules evaluated first-match.
//! Rule predicates may overlap; the order alone makes the branches mutually
//! exclusive. When no rule matches, the default weights apply.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Indicator names used by the default table
pub const CPI: &str = "CPI";
pub const GDP: &str = "GDP";
pub const UNEMPLOYMENT: &str = "Unemployment";

pub const STAGFLATION_CPI_ABOVE: f64 = 6.0;
pub const STAGFLATION_GDP_BELOW: f64 = 2.0;
pub const EXPANSION_GDP_ABOVE: f64 = 3.0;
pub const SLACK_LABOR_UNEMPLOYMENT_ABOVE: f64 = 7.0;

pub const STAGFLATION_WEIGHTS: Weights = Weights::new(0.20, 0.20, 0.50, 0.10);
pub const EXPANSION_WEIGHTS: Weights = Weights::new(0.60, 0.30, 0.05, 0.05);
pub const SLACK_LABOR_WEIGHTS: Weights = Weights::new(0.20, 0.50, 0.10, 0.20);
pub const NEUTRAL_WEIGHTS: Weights = Weights::new(0.50, 0.30, 0.10, 0.10);

/// Allowed distance of a weight vector's sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Portfolio weights over the four asset classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub equities: f64,
    pub bonds: f64,
    pub commodities: f64,
    pub cash: f64,
}

impl Weights {
    pub const fn new(equities: f64, bonds: f64, commodities: f64, cash: f64) -> Self {
        Self {
            equities,
            bonds,
            commodities,
            cash,
        }
    }

    pub fn total(&self) -> f64 {
        self.equities + self.bonds + self.commodities + self.cash
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.equities, self.bonds, self.commodities, self.cash]
    }

    /// Every weight finite and non-negative, summing to 1
    pub fn validate(&self, label: &str) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ForecastError::ConfigurationError(format!(
                "Weights for '{}' must be finite and non-negative: {:?}",
                label, self
            )));
        }
        if (self.total() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ForecastError::ConfigurationError(format!(
                "Weights for '{}' sum to {}, expected 1.0",
                label,
                self.total()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Strictly greater than the threshold
    Above,
    /// Strictly less than the threshold
    Below,
}

/// One comparison of an indicator's forecast against a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: String,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Condition {
    pub fn above(indicator: &str, threshold: f64) -> Self {
        Self {
            indicator: indicator.to_string(),
            comparison: Comparison::Above,
            threshold,
        }
    }

    pub fn below(indicator: &str, threshold: f64) -> Self {
        Self {
            indicator: indicator.to_string(),
            comparison: Comparison::Below,
            threshold,
        }
    }

    pub fn holds(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Above => value > self.threshold,
            Comparison::Below => value < self.threshold,
        }
    }
}

/// A named regime: all conditions must hold for its weights to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRule {
    pub regime: String,
    pub conditions: Vec<Condition>,
    pub weights: Weights,
}

/// Ordered rules plus the weights used when none match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTable {
    pub rules: Vec<RegimeRule>,
    pub default_regime: String,
    pub default_weights: Weights,
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self {
            rules: vec![
                RegimeRule {
                    regime: "stagflation".to_string(),
                    conditions: vec![
                        Condition::above(CPI, STAGFLATION_CPI_ABOVE),
                        Condition::below(GDP, STAGFLATION_GDP_BELOW),
                    ],
                    weights: STAGFLATION_WEIGHTS,
                },
                RegimeRule {
                    regime: "expansion".to_string(),
                    conditions: vec![Condition::above(GDP, EXPANSION_GDP_ABOVE)],
                    weights: EXPANSION_WEIGHTS,
                },
                RegimeRule {
                    regime: "slack_labor".to_string(),
                    conditions: vec![Condition::above(
                        UNEMPLOYMENT,
                        SLACK_LABOR_UNEMPLOYMENT_ABOVE,
                    )],
                    weights: SLACK_LABOR_WEIGHTS,
                },
            ],
            default_regime: "neutral".to_string(),
            default_weights: NEUTRAL_WEIGHTS,
        }
    }
}

impl AllocationTable {
    /// Check every branch, including the default
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();

        for rule in &self.rules {
            if rule.regime.is_empty() {
                return Err(ForecastError::ConfigurationError(
                    "Regime rules must be named".to_string(),
                ));
            }
            if !seen.insert(rule.regime.as_str()) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Regime '{}' is defined more than once",
                    rule.regime
                )));
            }
            if rule.conditions.is_empty() {
                return Err(ForecastError::ConfigurationError(format!(
                    "Regime '{}' has no conditions",
                    rule.regime
                )));
            }
            if let Some(bad) = rule.conditions.iter().find(|c| !c.threshold.is_finite()) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Regime '{}' has a non-finite threshold for '{}'",
                    rule.regime, bad.indicator
                )));
            }
            rule.weights.validate(&rule.regime)?;
        }

        if seen.contains(self.default_regime.as_str()) {
            return Err(ForecastError::ConfigurationError(format!(
                "Default regime '{}' shadows a rule of the same name",
                self.default_regime
            )));
        }
        self.default_weights.validate(&self.default_regime)
    }

    /// Every indicator any rule reads
    pub fn indicators(&self) -> BTreeSet<&str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.conditions.iter())
            .map(|c| c.indicator.as_str())
            .collect()
    }
}

/// Forecast level of each indicator on one date. `None` marks a value
/// known to be unavailable; it is never read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub values: BTreeMap<String, Option<f64>>,
}

impl IndicatorSnapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert of a known value
    pub fn with(mut self, indicator: &str, value: f64) -> Self {
        self.values.insert(indicator.to_string(), Some(value));
        self
    }

    pub fn set(&mut self, indicator: &str, value: Option<f64>) {
        self.values.insert(indicator.to_string(), value);
    }

    pub fn get(&self, indicator: &str) -> Option<f64> {
        self.values.get(indicator).copied().flatten()
    }
}

/// Weights chosen for one date and the regime that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationWeights {
    pub date: NaiveDate,
    pub regime: String,
    pub weights: Weights,
}

/// Evaluates the allocation table against snapshots
#[derive(Debug, Clone)]
pub struct RegimeAllocator {
    table: AllocationTable,
    required: Vec<String>,
}

impl RegimeAllocator {
    /// Validate the table up front so evaluation can never meet a bad branch
    pub fn new(table: AllocationTable) -> Result<Self> {
        table.validate()?;
        let required = table.indicators().into_iter().map(String::from).collect();
        Ok(Self { table, required })
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Indicators a snapshot must carry, in name order
    pub fn required_indicators(&self) -> &[String] {
        &self.required
    }

    /// Pick the weights of the first rule whose conditions all hold
    pub fn allocate(&self, snapshot: &IndicatorSnapshot) -> Result<AllocationWeights> {
        let mut levels = BTreeMap::new();
        for indicator in &self.required {
            match snapshot.get(indicator) {
                Some(value) => {
                    levels.insert(indicator.as_str(), value);
                }
                None => {
                    return Err(ForecastError::IncompleteSnapshot {
                        date: snapshot.date,
                        indicator: indicator.clone(),
                    })
                }
            }
        }

        let matched = self.table.rules.iter().find(|rule| {
            rule.conditions
                .iter()
                .all(|c| levels.get(c.indicator.as_str()).map_or(false, |v| c.holds(*v)))
        });

        let (regime, weights) = match matched {
            Some(rule) => (rule.regime.clone(), rule.weights),
            None => (self.table.default_regime.clone(), self.table.default_weights),
        };

        Ok(AllocationWeights {
            date: snapshot.date,
            regime,
            weights,
        })
    }
}
