//! Core types and constants

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticker identifier for equities
pub type Ticker = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Simple period return (0.05 == +5%)
pub type Return = f64;

/// Per-ticker ordered series, keyed by ticker so iteration order is stable
pub type TickerSeries<T> = BTreeMap<Ticker, Vec<T>>;

/// One raw daily price record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub ticker: Ticker,
    pub date: NaiveDate,
    pub price: Price,
}

impl PriceObservation {
    pub fn new(ticker: impl Into<Ticker>, date: NaiveDate, price: Price) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            price,
        }
    }
}

/// Last observed price of a month, stamped with the month-end date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPrice {
    pub date: NaiveDate,
    pub price: Price,
}

/// Monthly row while returns are being computed and cleaned.
///
/// `None` marks a missing value: a series boundary or a suppressed outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub date: NaiveDate,
    pub price: Option<Price>,
    pub trailing_return: Option<Return>,
    pub forward_return: Option<Return>,
}

impl ReturnRecord {
    /// True when every field carries a value
    pub fn is_complete(&self) -> bool {
        self.price.is_some() && self.trailing_return.is_some() && self.forward_return.is_some()
    }
}

/// Monthly row that survived outlier suppression and the missing-value drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub date: NaiveDate,
    pub price: Price,
    pub trailing_return: Return,
    pub forward_return: Return,
}

impl CleanRecord {
    /// `None` if any field is still missing
    pub fn from_record(record: &ReturnRecord) -> Option<Self> {
        Some(Self {
            date: record.date,
            price: record.price?,
            trailing_return: record.trailing_return?,
            forward_return: record.forward_return?,
        })
    }
}

/// Fully cleaned monthly row with its ranking signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub ticker: Ticker,
    pub date: NaiveDate,
    pub price: Price,
    pub trailing_return: Return,
    pub forward_return: Return,
    /// Mean trailing return over the ticker's last `rolling_window` records
    pub average_return: Return,
    pub signal: bool,
}

impl MonthlyRecord {
    /// Signal as a position size: 1 when selected, 0 otherwise
    pub fn weight(&self) -> f64 {
        if self.signal {
            1.0
        } else {
            0.0
        }
    }

    /// PnL of one unit held over the following month
    pub fn pnl(&self) -> f64 {
        self.weight() * self.forward_return
    }
}

/// Benchmark index price at a month end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub date: NaiveDate,
    pub price: Price,
    /// Missing for the first month of the series
    pub monthly_return: Option<Return>,
}
