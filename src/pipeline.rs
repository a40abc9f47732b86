//! Preprocessing and signal pipeline
//!
//! raw prices -> month-end prices -> returns -> outlier suppression -> signal

pub mod factors_returns;
pub mod filters;
pub mod signal;

pub use factors_returns::{compute_returns, ticker_returns, TrailingMean};
pub use filters::{
    drop_incomplete_all, iqr_price_outliers, MissingCounts, OutlierRule, PriceOutlier,
};
pub use signal::{select_top, SignalBuilder};

use crate::config::BacktestConfig;
use crate::data::resample::MonthlyResampler;
use crate::error::Result;
use crate::types::{CleanRecord, PriceObservation, TickerSeries};

/// Raw observations to cleaned monthly series
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    resampler: MonthlyResampler,
    rule: OutlierRule,
}

impl Preprocessor {
    pub fn new(resampler: MonthlyResampler, rule: OutlierRule) -> Self {
        Self { resampler, rule }
    }

    pub fn from_config(config: &BacktestConfig) -> Result<Self> {
        Ok(Self::new(
            MonthlyResampler::new(config.min_price, config.max_price),
            OutlierRule::new(
                config.max_monthly_gain,
                config.max_monthly_loss,
                config.crisis_window()?,
            ),
        ))
    }

    pub fn run<I>(&self, observations: I) -> TickerSeries<CleanRecord>
    where
        I: IntoIterator<Item = PriceObservation>,
    {
        let monthly = self.resampler.resample(observations);
        let returns = ticker_returns(&monthly);

        let filled = self.rule.fill_all(&returns);
        let missing = MissingCounts::count(&filled);
        log::info!(
            "Missing after suppression and fill: price={} trailing_return={} forward_return={} ({} total)",
            missing.price,
            missing.trailing_return,
            missing.forward_return,
            missing.total()
        );

        let cleaned = drop_incomplete_all(&filled);
        let rows_in: usize = filled.values().map(Vec::len).sum();
        let rows_out: usize = cleaned.values().map(Vec::len).sum();
        log::info!(
            "Processed prices: {} rows for {} tickers ({} incomplete rows dropped)",
            rows_out,
            cleaned.len(),
            rows_in - rows_out
        );
        cleaned
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(MonthlyResampler::default(), OutlierRule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReturnRecord;
    use chrono::NaiveDate;

    #[test]
    fn test_preprocess_three_months() {
        let observations = vec![
            PriceObservation::new("A", NaiveDate::from_ymd_opt(2010, 1, 15).unwrap(), 10.0),
            PriceObservation::new("A", NaiveDate::from_ymd_opt(2010, 2, 15).unwrap(), 11.0),
            PriceObservation::new("A", NaiveDate::from_ymd_opt(2010, 3, 15).unwrap(), 9.0),
        ];

        let cleaned = Preprocessor::default().run(observations);

        // January lacks a trailing return, March lacks a forward return
        let rows = &cleaned["A"];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2010, 2, 28).unwrap());
        assert!((rows[0].trailing_return - 0.1).abs() < 1e-12);
        assert!((rows[0].forward_return - (9.0 / 11.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_counts_after_fill() {
        let rule = OutlierRule::default();
        let date = |m| NaiveDate::from_ymd_opt(2010, m, 28).unwrap();
        let returns: TickerSeries<ReturnRecord> = [(
            "A".to_string(),
            vec![
                ReturnRecord {
                    date: date(1),
                    price: Some(10.0),
                    trailing_return: None,
                    forward_return: Some(3.0),
                },
                ReturnRecord {
                    date: date(2),
                    price: Some(40.0),
                    trailing_return: Some(3.0),
                    forward_return: Some(0.1),
                },
                ReturnRecord {
                    date: date(3),
                    price: Some(44.0),
                    trailing_return: Some(0.1),
                    forward_return: None,
                },
            ],
        )]
        .into_iter()
        .collect();

        let filled = rule.fill_all(&returns);
        let missing = MissingCounts::count(&filled);

        // the +300% moves are suppressed; February's trailing gap has nothing to fill from
        assert_eq!(missing.price, 0);
        assert_eq!(missing.trailing_return, 2);
        assert_eq!(missing.forward_return, 2);
        assert_eq!(missing.total(), 4);

        let cleaned = drop_incomplete_all(&filled);
        assert!(cleaned.is_empty());
    }
}
