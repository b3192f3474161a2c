//! Sampling cadence of an indicator series
//!
//! Future dates are always computed from the anchor date as
//! `anchor + k * step`, never by adding steps one after another, so a
//! month-end anchor cannot drift to the 28th after passing February.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native sampling frequency of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    /// Same day of month every `n` months (monthly, quarterly, ...)
    Months(u32),
    /// Last day of the month every `n` months
    MonthEnd(u32),
    /// Every `n` days
    Days(u32),
}

impl Cadence {
    /// Infer the cadence from sorted, distinct dates. Uses the smallest gap
    /// so a series with a few missing periods keeps its native step.
    pub fn infer(dates: &[NaiveDate]) -> Option<Self> {
        if dates.len() < 2 {
            return None;
        }

        if dates.iter().all(|d| is_month_end(*d)) {
            return min_month_gap(dates).map(Cadence::MonthEnd);
        }

        let day = dates[0].day();
        if dates.iter().all(|d| d.day() == day) {
            return min_month_gap(dates).map(Cadence::Months);
        }

        dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .filter(|gap| *gap > 0)
            .min()
            .and_then(|gap| u32::try_from(gap).ok())
            .map(Cadence::Days)
    }

    /// Date `periods` steps after `anchor`
    pub fn advance(&self, anchor: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match *self {
            Cadence::Months(step) => {
                anchor.checked_add_months(Months::new(step.checked_mul(periods)?))
            }
            Cadence::MonthEnd(step) => {
                let shifted = first_of_month(anchor)?
                    .checked_add_months(Months::new(step.checked_mul(periods)?))?;
                month_end(shifted)
            }
            Cadence::Days(step) => {
                anchor.checked_add_days(Days::new(u64::from(step) * u64::from(periods)))
            }
        }
    }

    /// The `horizon` dates following `last`
    pub fn future_dates(&self, last: NaiveDate, horizon: usize) -> Option<Vec<NaiveDate>> {
        (1..=horizon)
            .map(|k| u32::try_from(k).ok().and_then(|k| self.advance(last, k)))
            .collect()
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Months(1) => write!(f, "monthly"),
            Cadence::Months(3) => write!(f, "quarterly"),
            Cadence::Months(n) => write!(f, "every {} months", n),
            Cadence::MonthEnd(n) => write!(f, "month-end every {} months", n),
            Cadence::Days(n) => write!(f, "every {} days", n),
        }
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn min_month_gap(dates: &[NaiveDate]) -> Option<u32> {
    dates
        .windows(2)
        .map(|pair| month_index(pair[1]) - month_index(pair[0]))
        .filter(|gap| *gap > 0)
        .min()
        .and_then(|gap| u32::try_from(gap).ok())
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_infer_monthly_and_quarterly() {
        let monthly = vec![ymd(2023, 1, 1), ymd(2023, 2, 1), ymd(2023, 3, 1)];
        assert_eq!(Cadence::infer(&monthly), Some(Cadence::Months(1)));

        let quarterly = vec![ymd(2023, 1, 1), ymd(2023, 4, 1), ymd(2023, 7, 1)];
        assert_eq!(Cadence::infer(&quarterly), Some(Cadence::Months(3)));

        // one missing month keeps the monthly step
        let gappy = vec![ymd(2023, 1, 1), ymd(2023, 3, 1), ymd(2023, 4, 1)];
        assert_eq!(Cadence::infer(&gappy), Some(Cadence::Months(1)));
    }

    #[test]
    fn test_infer_month_end_and_days() {
        let month_ends = vec![ymd(2023, 1, 31), ymd(2023, 2, 28), ymd(2023, 3, 31)];
        assert_eq!(Cadence::infer(&month_ends), Some(Cadence::MonthEnd(1)));

        let weekly = vec![ymd(2023, 1, 2), ymd(2023, 1, 9), ymd(2023, 1, 16)];
        assert_eq!(Cadence::infer(&weekly), Some(Cadence::Days(7)));

        assert_eq!(Cadence::infer(&[ymd(2023, 1, 1)]), None);
    }

    #[test]
    fn test_month_end_does_not_drift() {
        let cadence = Cadence::MonthEnd(1);
        let dates = cadence.future_dates(ymd(2023, 1, 31), 3).unwrap();
        assert_eq!(dates, vec![ymd(2023, 2, 28), ymd(2023, 3, 31), ymd(2023, 4, 30)]);
    }

    #[test]
    fn test_advance_months_from_anchor() {
        let cadence = Cadence::Months(1);
        assert_eq!(cadence.advance(ymd(2023, 6, 1), 0), Some(ymd(2023, 6, 1)));
        assert_eq!(cadence.advance(ymd(2023, 11, 1), 3), Some(ymd(2024, 2, 1)));

        let quarterly = Cadence::Months(3);
        assert_eq!(
            quarterly.future_dates(ymd(2023, 10, 1), 2).unwrap(),
            vec![ymd(2024, 1, 1), ymd(2024, 4, 1)]
        );
    }

    #[test]
    fn test_advance_days() {
        let cadence = Cadence::Days(7);
        assert_eq!(cadence.advance(ymd(2023, 1, 30), 1), Some(ymd(2023, 2, 6)));
        assert!(cadence.future_dates(ymd(2023, 1, 30), 0).unwrap().is_empty());
    }
}
