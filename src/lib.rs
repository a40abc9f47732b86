//! # momentum_backtest
//!
//! Backtests a monthly momentum stock-picking strategy against a market-index
//! benchmark.
//!
//! Daily prices are resampled to month ends, turned into trailing and forward
//! returns, cleaned of implausible moves outside the 2008-2009 crisis window,
//! and ranked each month by their trailing 12-month average return. The top 20
//! tickers are held equal-weight for one month and compared with a fixed-size
//! position in the benchmark.
//!
//! ## Example
//!
//! ```rust,no_run
//! use momentum_backtest::prelude::*;
//!
//! let config = BacktestConfig::default();
//! let run = BacktestEngine::new(config)?.run()?;
//! println!("{}", run.result.summary);
//! # Ok::<(), BacktestError>(())
//! ```

pub mod calendar;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod performance;
pub mod pipeline;
pub mod report;
pub mod types;

pub mod prelude {
    //! Commonly used types
    pub use crate::calendar::CrisisWindow;
    pub use crate::config::BacktestConfig;
    pub use crate::data::{BenchmarkSeries, CsvTableLoader, MonthlyResampler};
    pub use crate::engine::{BacktestEngine, BacktestRun};
    pub use crate::error::{BacktestError, Result};
    pub use crate::performance::{BacktestEvaluator, BacktestResult, BacktestSummary};
    pub use crate::pipeline::{OutlierRule, Preprocessor, SignalBuilder};
    pub use crate::types::*;
}
