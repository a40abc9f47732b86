//! Benchmark index preparation
//!
//! The benchmark is resampled to month ends like the equity universe, but no
//! price band or outlier rule is applied to it.

use crate::data::loader::BenchmarkTable;
use crate::data::resample::resample_series;
use crate::types::{BenchmarkRecord, Return};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Month-end benchmark prices with month-over-month returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkSeries {
    records: Vec<BenchmarkRecord>,
}

impl BenchmarkSeries {
    /// Build from month-end (date, price) pairs sorted ascending
    pub fn from_monthly_prices(prices: &[(NaiveDate, f64)]) -> Self {
        let mut records = Vec::with_capacity(prices.len());
        let mut prev: Option<f64> = None;

        for &(date, price) in prices {
            let monthly_return = prev.map(|p| price / p - 1.0);
            records.push(BenchmarkRecord {
                date,
                price,
                monthly_return,
            });
            prev = Some(price);
        }

        Self { records }
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Monthly returns keyed by month end, months without a return omitted
    pub fn returns(&self) -> BTreeMap<NaiveDate, Return> {
        self.records
            .iter()
            .filter_map(|r| r.monthly_return.map(|ret| (r.date, ret)))
            .collect()
    }
}

/// Resample a raw benchmark table to month ends and compute returns
pub fn monthly_benchmark(table: &BenchmarkTable) -> BenchmarkSeries {
    let monthly = resample_series(table.closes().collect());
    let prices: Vec<(NaiveDate, f64)> = monthly.iter().map(|m| (m.date, m.price)).collect();
    BenchmarkSeries::from_monthly_prices(&prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::CsvTableLoader;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_returns() {
        let series = BenchmarkSeries::from_monthly_prices(&[
            (date(2010, 1, 31), 100.0),
            (date(2010, 2, 28), 102.0),
            (date(2010, 3, 31), 99.96),
        ]);

        assert_eq!(series.records()[0].monthly_return, None);
        let returns = series.returns();
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[&date(2010, 2, 28)], 0.02, epsilon = 1e-12);
        assert_relative_eq!(returns[&date(2010, 3, 31)], -0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_from_daily_table() {
        let csv = "date,adj_close\n\
                   2010-01-04,100\n\
                   2010-01-29,110\n\
                   2010-02-26,121\n";
        let table = CsvTableLoader::new().read_benchmark(csv.as_bytes()).unwrap();
        let series = monthly_benchmark(&table);

        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[0].price, 110.0);
        assert_relative_eq!(series.returns()[&date(2010, 2, 28)], 0.1, epsilon = 1e-12);
    }
}
