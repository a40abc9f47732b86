//! Backtest configuration
//!
//! Every threshold of the pipeline lives here so a run is fully described by one
//! TOML file. Missing keys fall back to the defaults below.
//!
//! ```toml
//! prices_path = "data/prices.csv"
//! benchmark_path = "data/sp500.csv"
//! top_n = 20
//! crisis_start = "2008-01-01"
//! crisis_end = "2009-12-31"
//! ```

use crate::calendar::CrisisWindow;
use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_prices_path")]
    pub prices_path: PathBuf,
    #[serde(default = "default_benchmark_path")]
    pub benchmark_path: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Tickers selected per month
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Units invested in the benchmark each month
    #[serde(default = "default_benchmark_unit")]
    pub benchmark_unit: f64,
    /// Months in the trailing average used for ranking
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    #[serde(default = "default_min_price")]
    pub min_price: f64,
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    #[serde(default = "default_max_monthly_gain")]
    pub max_monthly_gain: f64,
    #[serde(default = "default_max_monthly_loss")]
    pub max_monthly_loss: f64,
    #[serde(default = "default_crisis_start")]
    pub crisis_start: NaiveDate,
    #[serde(default = "default_crisis_end")]
    pub crisis_end: NaiveDate,

    #[serde(default = "default_outlier_report_limit")]
    pub outlier_report_limit: usize,
    #[serde(default = "default_write_chart")]
    pub write_chart: bool,
    /// Strategy name in results and chart, shown with the `(Top N)` suffix
    #[serde(default = "default_strategy_label")]
    pub strategy_label: String,
    #[serde(default = "default_benchmark_label")]
    pub benchmark_label: String,
}

fn default_prices_path() -> PathBuf {
    PathBuf::from("data").join("prices.csv")
}

fn default_benchmark_path() -> PathBuf {
    PathBuf::from("data").join("sp500.csv")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_top_n() -> usize {
    20
}

fn default_benchmark_unit() -> f64 {
    20.0
}

fn default_rolling_window() -> usize {
    12
}

fn default_min_price() -> f64 {
    0.1
}

fn default_max_price() -> f64 {
    10_000.0
}

fn default_max_monthly_gain() -> f64 {
    1.0
}

fn default_max_monthly_loss() -> f64 {
    -0.5
}

fn default_crisis_start() -> NaiveDate {
    CrisisWindow::default().start
}

fn default_crisis_end() -> NaiveDate {
    CrisisWindow::default().end
}

fn default_outlier_report_limit() -> usize {
    5
}

fn default_write_chart() -> bool {
    true
}

fn default_strategy_label() -> String {
    "Stock Picking Strategy".to_string()
}

fn default_benchmark_label() -> String {
    "S&P 500".to_string()
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            prices_path: default_prices_path(),
            benchmark_path: default_benchmark_path(),
            results_dir: default_results_dir(),
            top_n: default_top_n(),
            benchmark_unit: default_benchmark_unit(),
            rolling_window: default_rolling_window(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            max_monthly_gain: default_max_monthly_gain(),
            max_monthly_loss: default_max_monthly_loss(),
            crisis_start: default_crisis_start(),
            crisis_end: default_crisis_end(),
            outlier_report_limit: default_outlier_report_limit(),
            write_chart: default_write_chart(),
            strategy_label: default_strategy_label(),
            benchmark_label: default_benchmark_label(),
        }
    }
}

impl BacktestConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(BacktestError::ConfigError(
                "top_n must be greater than 0".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(BacktestError::ConfigError(
                "rolling_window must be greater than 0".to_string(),
            ));
        }
        if self.min_price >= self.max_price {
            return Err(BacktestError::ConfigError(format!(
                "min_price {} must be less than max_price {}",
                self.min_price, self.max_price
            )));
        }
        if self.max_monthly_loss >= self.max_monthly_gain {
            return Err(BacktestError::ConfigError(format!(
                "max_monthly_loss {} must be less than max_monthly_gain {}",
                self.max_monthly_loss, self.max_monthly_gain
            )));
        }
        self.crisis_window()?;
        Ok(())
    }

    pub fn crisis_window(&self) -> Result<CrisisWindow> {
        CrisisWindow::new(self.crisis_start, self.crisis_end)
    }

    /// Path of the plain-text results summary
    pub fn results_file(&self) -> PathBuf {
        self.results_dir.join("results.txt")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.results_dir.join("summary.json")
    }

    pub fn outliers_file(&self) -> PathBuf {
        self.results_dir.join("outliers.txt")
    }

    /// Strategy heading, e.g. `Stock Picking Strategy (Top 20)`
    pub fn strategy_title(&self) -> String {
        format!("{} (Top {})", self.strategy_label, self.top_n)
    }

    pub fn benchmark_title(&self) -> String {
        format!("{} Benchmark", self.benchmark_label)
    }

    pub fn chart_file(&self) -> PathBuf {
        self.results_dir
            .join("plots")
            .join("strategy_performance.svg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BacktestConfig::default();
        assert_eq!(config.top_n, 20);
        assert_eq!(config.benchmark_unit, 20.0);
        assert_eq!(config.rolling_window, 12);
        assert!(config.validate().is_ok());
        assert_eq!(config.crisis_window().unwrap(), CrisisWindow::default());
        assert_eq!(config.strategy_title(), "Stock Picking Strategy (Top 20)");
        assert_eq!(config.benchmark_title(), "S&P 500 Benchmark");
    }

    #[test]
    fn test_labels_from_toml() {
        let config = BacktestConfig::from_toml(
            r#"
            top_n = 10
            strategy_label = "Momentum"
            benchmark_label = "Russell 1000"
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy_label, "Momentum");
        assert_eq!(config.strategy_title(), "Momentum (Top 10)");
        assert_eq!(config.benchmark_title(), "Russell 1000 Benchmark");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BacktestConfig::from_toml(
            r#"
            top_n = 5
            results_dir = "out"
            crisis_start = "2001-01-01"
            "#,
        )
        .unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(config.results_dir, PathBuf::from("out"));
        assert_eq!(config.results_file(), PathBuf::from("out").join("results.txt"));
        assert_eq!(
            config.crisis_start,
            NaiveDate::from_ymd_opt(2001, 1, 1).unwrap()
        );
        assert_eq!(config.max_price, 10_000.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(BacktestConfig::from_toml("top_n = 0").is_err());
        assert!(BacktestConfig::from_toml("min_price = 50.0\nmax_price = 10.0").is_err());
        assert!(BacktestConfig::from_toml(
            "crisis_start = \"2010-01-01\"\ncrisis_end = \"2009-01-01\""
        )
        .is_err());
    }
}
