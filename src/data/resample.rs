//! Daily to month-end resampling
//!
//! Each month keeps the last observation on or before its final calendar day,
//! stamped with the month-end date. Months without any observation produce no
//! row.

use crate::calendar::{month_end, month_key};
use crate::types::{MonthlyPrice, Price, PriceObservation, TickerSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Collapse one ordered-or-not series of (date, price) into month-end prices.
///
/// Observations sharing a date keep their input order, so the later one wins.
pub fn resample_series(mut points: Vec<(NaiveDate, Price)>) -> Vec<MonthlyPrice> {
    points.sort_by_key(|(date, _)| *date);

    let mut months: BTreeMap<(i32, u32), MonthlyPrice> = BTreeMap::new();
    for (date, price) in points {
        months.insert(
            month_key(date),
            MonthlyPrice {
                date: month_end(date),
                price,
            },
        );
    }

    months.into_values().collect()
}

/// Group raw observations by ticker and resample each group to month ends
pub fn resample_monthly<I>(observations: I) -> TickerSeries<MonthlyPrice>
where
    I: IntoIterator<Item = PriceObservation>,
{
    let mut grouped: BTreeMap<String, Vec<(NaiveDate, Price)>> = BTreeMap::new();
    for obs in observations {
        grouped
            .entry(obs.ticker)
            .or_default()
            .push((obs.date, obs.price));
    }

    grouped
        .into_iter()
        .map(|(ticker, points)| (ticker, resample_series(points)))
        .collect()
}

/// Drop month-end prices outside `[min_price, max_price]`.
///
/// Tickers left with no rows disappear from the result.
pub fn filter_price_range(
    series: TickerSeries<MonthlyPrice>,
    min_price: Price,
    max_price: Price,
) -> TickerSeries<MonthlyPrice> {
    series
        .into_iter()
        .filter_map(|(ticker, prices)| {
            let kept: Vec<MonthlyPrice> = prices
                .into_iter()
                .filter(|p| p.price >= min_price && p.price <= max_price)
                .collect();
            (!kept.is_empty()).then_some((ticker, kept))
        })
        .collect()
}

/// Resampler with the admissible price band applied
#[derive(Debug, Clone, Copy)]
pub struct MonthlyResampler {
    min_price: Price,
    max_price: Price,
}

impl MonthlyResampler {
    pub fn new(min_price: Price, max_price: Price) -> Self {
        Self {
            min_price,
            max_price,
        }
    }

    pub fn resample<I>(&self, observations: I) -> TickerSeries<MonthlyPrice>
    where
        I: IntoIterator<Item = PriceObservation>,
    {
        let monthly = resample_monthly(observations);
        let before: usize = monthly.values().map(Vec::len).sum();

        let filtered = filter_price_range(monthly, self.min_price, self.max_price);
        let after: usize = filtered.values().map(Vec::len).sum();

        if before > after {
            log::info!(
                "Dropped {} monthly prices outside [{}, {}]",
                before - after,
                self.min_price,
                self.max_price
            );
        }
        filtered
    }
}

impl Default for MonthlyResampler {
    fn default() -> Self {
        Self::new(0.1, 10_000.0)
    }
}
