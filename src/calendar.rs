//! Month-end calendar helpers and the crisis window

use crate::error::{BacktestError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Last calendar day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// (year, month) key used to bucket observations
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Closed calendar interval exempt from return-outlier suppression.
///
/// The default covers 2008-01-01 through 2009-12-31, when large monthly moves
/// were genuine rather than data artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CrisisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(BacktestError::ConfigError(format!(
                "crisis window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Both bounds inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl Default for CrisisWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2008, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2009, 12, 31).unwrap_or_default(),
        }
    }
}
