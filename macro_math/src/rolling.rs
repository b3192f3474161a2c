//! Rolling sample standard deviation
//!
//! Uses the `n - 1` denominator. A window reports no value until it is full;
//! a partial window is never used as an estimate.

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Sample standard deviation of a slice. Needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation needs at least 2 values, have {}",
            values.len()
        )));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(variance.sqrt())
}

/// Trailing window over the most recent `period` values
#[derive(Debug, Clone)]
pub struct RollingStdDev {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingStdDev {
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Rolling window must be at least 2, got {}",
                period
            )));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Push a value and return the window's standard deviation once full
    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
        self.value()
    }

    /// Standard deviation of the current window, `None` while it is filling
    pub fn value(&self) -> Option<f64> {
        if self.values.len() < self.period {
            return None;
        }
        let (front, back) = self.values.as_slices();
        let window: Vec<f64> = front.iter().chain(back.iter()).copied().collect();
        sample_std_dev(&window).ok()
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}
