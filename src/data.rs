//! Market data loading and monthly preparation

pub mod benchmarks;
pub mod loader;
pub mod resample;

pub use benchmarks::{monthly_benchmark, BenchmarkSeries};
pub use loader::{BenchmarkTable, CsvTableLoader, PriceColumn, PriceTable};
pub use resample::{filter_price_range, resample_monthly, MonthlyResampler};
