//! Returns factors - trailing and forward monthly returns
//!
//! Returns are computed per ticker over its month-end series sorted by date:
//! `trailing[t] = price[t] / price[t-1] - 1` and `forward[t] = trailing[t+1]`.

use crate::types::{MonthlyPrice, ReturnRecord, TickerSeries};
use std::collections::VecDeque;

/// Simple return between two prices
pub fn simple_return(from: f64, to: f64) -> f64 {
    to / from - 1.0
}

/// Trailing and forward returns for one ticker's monthly prices.
///
/// The first record has no trailing return and the last has no forward return.
pub fn compute_returns(prices: &[MonthlyPrice]) -> Vec<ReturnRecord> {
    let trailing: Vec<Option<f64>> = std::iter::once(None)
        .chain(
            prices
                .windows(2)
                .map(|w| Some(simple_return(w[0].price, w[1].price))),
        )
        .collect();

    prices
        .iter()
        .enumerate()
        .map(|(i, p)| ReturnRecord {
            date: p.date,
            price: Some(p.price),
            trailing_return: trailing[i],
            forward_return: trailing.get(i + 1).copied().flatten(),
        })
        .collect()
}

/// Apply [`compute_returns`] to every ticker
pub fn ticker_returns(series: &TickerSeries<MonthlyPrice>) -> TickerSeries<ReturnRecord> {
    series
        .iter()
        .map(|(ticker, prices)| {
            let mut sorted = prices.clone();
            sorted.sort_by_key(|p| p.date);
            (ticker.clone(), compute_returns(&sorted))
        })
        .collect()
}

/// TrailingMean - rolling mean over the last `window` values.
///
/// Emits a value from the first update on, averaging whatever history exists.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    window: usize,
    values: VecDeque<f64>,
}

impl TrailingMean {
    /// Create a rolling mean; a zero window is treated as one
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
        }
    }

    /// Push a value and return the current mean
    pub fn update(&mut self, value: f64) -> f64 {
        self.values.push_back(value);

        if self.values.len() > self.window {
            self.values.pop_front();
        }

        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Rolling means for a slice of values
    pub fn compute(window: usize, values: &[f64]) -> Vec<f64> {
        let mut mean = Self::new(window);
        values.iter().map(|&v| mean.update(v)).collect()
    }
}
