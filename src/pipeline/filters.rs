//! Pipeline Filters - return-outlier suppression and price-outlier diagnostics
//!
//! Suppression is a pure per-ticker transform. Returns above `max_gain` or
//! below `max_loss` become missing, except on dates inside the crisis window.
//! Prices and trailing returns are then forward-filled; forward returns never
//! are, and any row still missing a field is dropped.

use crate::calendar::CrisisWindow;
use crate::types::{CleanRecord, PriceObservation, ReturnRecord, TickerSeries};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::Serialize;

/// Static return thresholds with the crisis-window exemption
#[derive(Debug, Clone, Copy)]
pub struct OutlierRule {
    max_gain: f64,
    max_loss: f64,
    crisis: CrisisWindow,
}

impl OutlierRule {
    pub fn new(max_gain: f64, max_loss: f64, crisis: CrisisWindow) -> Self {
        Self {
            max_gain,
            max_loss,
            crisis,
        }
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value > self.max_gain || value < self.max_loss
    }

    fn screen(&self, value: Option<f64>) -> Option<f64> {
        value.filter(|v| !self.is_outlier(*v))
    }

    /// Null out-of-band returns on non-crisis dates
    pub fn suppress(&self, records: &[ReturnRecord]) -> Vec<ReturnRecord> {
        records
            .iter()
            .map(|r| {
                if self.crisis.contains(r.date) {
                    *r
                } else {
                    ReturnRecord {
                        trailing_return: self.screen(r.trailing_return),
                        forward_return: self.screen(r.forward_return),
                        ..*r
                    }
                }
            })
            .collect()
    }

    /// Suppress then forward-fill one ticker, keeping incomplete rows
    pub fn fill(&self, records: &[ReturnRecord]) -> Vec<ReturnRecord> {
        forward_fill(&self.suppress(records))
    }

    /// [`OutlierRule::fill`] for every ticker
    pub fn fill_all(&self, series: &TickerSeries<ReturnRecord>) -> TickerSeries<ReturnRecord> {
        series
            .iter()
            .map(|(ticker, records)| (ticker.clone(), self.fill(records)))
            .collect()
    }
}

impl Default for OutlierRule {
    fn default() -> Self {
        Self::new(1.0, -0.5, CrisisWindow::default())
    }
}

/// Carry the last known price and trailing return across gaps
pub fn forward_fill(records: &[ReturnRecord]) -> Vec<ReturnRecord> {
    let mut last_price = None;
    let mut last_trailing = None;

    records
        .iter()
        .map(|r| {
            last_price = r.price.or(last_price);
            last_trailing = r.trailing_return.or(last_trailing);
            ReturnRecord {
                price: last_price,
                trailing_return: last_trailing,
                ..*r
            }
        })
        .collect()
}

/// Drop rows without a forward return, then rows missing anything else
pub fn drop_incomplete(records: &[ReturnRecord]) -> Vec<CleanRecord> {
    records
        .iter()
        .filter(|r| r.forward_return.is_some())
        .filter_map(CleanRecord::from_record)
        .collect()
}

/// [`drop_incomplete`] for every ticker, dropping emptied tickers
pub fn drop_incomplete_all(series: &TickerSeries<ReturnRecord>) -> TickerSeries<CleanRecord> {
    series
        .iter()
        .filter_map(|(ticker, records)| {
            let cleaned = drop_incomplete(records);
            (!cleaned.is_empty()).then(|| (ticker.clone(), cleaned))
        })
        .collect()
}

/// Per-field count of missing values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MissingCounts {
    pub price: usize,
    pub trailing_return: usize,
    pub forward_return: usize,
}

impl MissingCounts {
    pub fn count(series: &TickerSeries<ReturnRecord>) -> Self {
        series
            .values()
            .flatten()
            .fold(Self::default(), |mut acc, r| {
                acc.price += r.price.is_none() as usize;
                acc.trailing_return += r.trailing_return.is_none() as usize;
                acc.forward_return += r.forward_return.is_none() as usize;
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.price + self.trailing_return + self.forward_return
    }
}

/// Raw price flagged by the interquartile-range check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOutlier {
    pub ticker: String,
    pub date: NaiveDate,
    pub price: f64,
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Flag raw prices outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` of their ticker.
///
/// Tickers are visited in first-appearance order and rows in input order; at
/// most `per_ticker` rows are taken from each ticker. Diagnostic only: it has
/// no effect on the return suppression above.
pub fn iqr_price_outliers(
    observations: &[PriceObservation],
    per_ticker: usize,
) -> Vec<PriceOutlier> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&PriceObservation>> = HashMap::new();
    for obs in observations {
        let group = groups.entry(obs.ticker.as_str()).or_insert_with(|| {
            order.push(obs.ticker.as_str());
            Vec::new()
        });
        group.push(obs);
    }

    let mut outliers = Vec::new();
    for ticker in order {
        let Some(rows) = groups.get(ticker) else {
            continue;
        };

        let mut prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
        prices.sort_by(|a, b| a.total_cmp(b));
        let q1 = quantile(&prices, 0.25);
        let q3 = quantile(&prices, 0.75);
        let iqr = q3 - q1;
        let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        outliers.extend(
            rows.iter()
                .filter(|r| r.price < lower || r.price > upper)
                .take(per_ticker)
                .map(|r| PriceOutlier {
                    ticker: r.ticker.clone(),
                    date: r.date,
                    price: r.price,
                }),
        );
    }
    outliers
}
