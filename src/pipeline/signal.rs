//! Cross-sectional momentum signal
//!
//! Each ticker is scored by the mean of its trailing returns over the last
//! `rolling_window` cleaned records. Every month is then ranked on its own:
//! the `top_n` highest scores are selected, or the whole cross-section when it
//! has fewer than `top_n` tickers.
//!
//! Within a month rows are ordered by ticker and the ranking sort is stable,
//! so equal scores are broken by ticker in ascending order.

use crate::pipeline::factors_returns::TrailingMean;
use crate::types::{CleanRecord, MonthlyRecord, TickerSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct SignalBuilder {
    top_n: usize,
    rolling_window: usize,
}

impl SignalBuilder {
    pub fn new(top_n: usize, rolling_window: usize) -> Self {
        Self {
            top_n,
            rolling_window,
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Score, partition by month and rank. Output is ordered by (date, ticker).
    pub fn build(&self, series: &TickerSeries<CleanRecord>) -> Vec<MonthlyRecord> {
        let mut by_date: BTreeMap<NaiveDate, Vec<MonthlyRecord>> = BTreeMap::new();

        for (ticker, records) in series {
            let trailing: Vec<f64> = records.iter().map(|r| r.trailing_return).collect();
            let averages = TrailingMean::compute(self.rolling_window, &trailing);

            for (record, average_return) in records.iter().zip(averages) {
                by_date.entry(record.date).or_default().push(MonthlyRecord {
                    ticker: ticker.clone(),
                    date: record.date,
                    price: record.price,
                    trailing_return: record.trailing_return,
                    forward_return: record.forward_return,
                    average_return,
                    signal: false,
                });
            }
        }

        by_date
            .into_values()
            .flat_map(|month| {
                let ranked = select_top(month, self.top_n);
                log::debug!(
                    "{}: {} of {} tickers selected",
                    ranked.first().map(|r| r.date.to_string()).unwrap_or_default(),
                    ranked.iter().filter(|r| r.signal).count(),
                    ranked.len()
                );
                ranked
            })
            .collect()
    }
}

impl Default for SignalBuilder {
    fn default() -> Self {
        Self::new(20, 12)
    }
}

/// Flag the `top_n` highest `average_return` rows of one cross-section
pub fn select_top(mut month: Vec<MonthlyRecord>, top_n: usize) -> Vec<MonthlyRecord> {
    if month.len() < top_n {
        for record in &mut month {
            record.signal = true;
        }
        return month;
    }

    let mut ranking: Vec<usize> = (0..month.len()).collect();
    ranking.sort_by(|&a, &b| month[b].average_return.total_cmp(&month[a].average_return));

    for &idx in ranking.iter().take(top_n) {
        month[idx].signal = true;
    }
    month
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ticker: &str, average_return: f64) -> MonthlyRecord {
        MonthlyRecord {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2010, 1, 31).unwrap(),
            price: 10.0,
            trailing_return: average_return,
            forward_return: 0.0,
            average_return,
            signal: false,
        }
    }

    #[test]
    fn test_small_cross_section_all_selected() {
        let month = vec![row("A", -0.1), row("B", 0.2), row("C", 0.0)];
        let ranked = select_top(month, 20);
        assert!(ranked.iter().all(|r| r.signal));
    }

    #[test]
    fn test_top_n_selected() {
        let month: Vec<_> = (0..25)
            .map(|i| row(&format!("T{:02}", i), i as f64 / 100.0))
            .collect();
        let ranked = select_top(month, 20);

        let selected: Vec<_> = ranked.iter().filter(|r| r.signal).collect();
        assert_eq!(selected.len(), 20);
        assert!(ranked[..5].iter().all(|r| !r.signal));
    }

    #[test]
    fn test_ties_keep_ticker_order() {
        let month = vec![row("A", 0.1), row("B", 0.1), row("C", 0.1), row("D", 0.5)];
        let ranked = select_top(month, 2);

        let selected: Vec<_> = ranked
            .iter()
            .filter(|r| r.signal)
            .map(|r| r.ticker.as_str())
            .collect();
        assert_eq!(selected, vec!["A", "D"]);
    }

    #[test]
    fn test_ranking_is_a_total_order() {
        let month = vec![row("A", -0.0), row("B", 0.0), row("C", -0.2)];
        let ranked = select_top(month, 1);

        let selected: Vec<_> = ranked
            .iter()
            .filter(|r| r.signal)
            .map(|r| r.ticker.as_str())
            .collect();
        assert_eq!(selected, vec!["B"]);
    }

    #[test]
    fn test_rolling_average_uses_ticker_history() {
        let mut series = TickerSeries::new();
        let records: Vec<CleanRecord> = (1..=3)
            .map(|m| CleanRecord {
                date: NaiveDate::from_ymd_opt(2010, m, 28).unwrap(),
                price: 10.0,
                trailing_return: m as f64 / 10.0,
                forward_return: 0.0,
            })
            .collect();
        series.insert("AAA".to_string(), records);

        let table = SignalBuilder::new(20, 2).build(&series);
        let averages: Vec<f64> = table.iter().map(|r| r.average_return).collect();

        assert_eq!(table.len(), 3);
        assert!((averages[0] - 0.1).abs() < 1e-12);
        assert!((averages[1] - 0.15).abs() < 1e-12);
        assert!((averages[2] - 0.25).abs() < 1e-12);
    }
}
