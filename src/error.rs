//! Error types for the momentum backtest

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the momentum backtest
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: u64, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No overlapping months between strategy and benchmark")]
    NoOverlap,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Config file error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for backtest operations
pub type Result<T> = std::result::Result<T, BacktestError>;
