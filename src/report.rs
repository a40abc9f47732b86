//! Result files: text summary, JSON summary, outlier list and PnL chart

pub mod chart;

pub use chart::{render_pnl_chart, ChartSeries};

use crate::error::Result;
use crate::performance::{BacktestResult, BacktestSummary};
use crate::pipeline::filters::PriceOutlier;
use std::fmt;
use std::fs;
use std::path::Path;

/// Plain-text results summary under the given headings
pub struct ResultsReport<'a> {
    pub summary: &'a BacktestSummary,
    pub strategy_title: &'a str,
    pub benchmark_title: &'a str,
}

impl fmt::Display for ResultsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = &self.summary.strategy;
        let benchmark = &self.summary.benchmark;

        writeln!(f, "BACKTESTING RESULTS")?;
        writeln!(f, "==================\n")?;
        writeln!(f, "{}:", self.strategy_title)?;
        writeln!(
            f,
            "Total Return: {:.4} ({:.2}%)",
            strategy.total_return,
            strategy.total_return * 100.0
        )?;
        writeln!(f, "PnL: ${:.2}\n", strategy.total_pnl)?;
        writeln!(f, "{}:", self.benchmark_title)?;
        writeln!(
            f,
            "Total Return: {:.4} ({:.2}%)",
            benchmark.total_return,
            benchmark.total_return * 100.0
        )?;
        writeln!(f, "PnL: ${:.2}\n", benchmark.total_pnl)?;
        writeln!(
            f,
            "Outperformance: {:.2}%",
            self.summary.outperformance * 100.0
        )?;
        writeln!(
            f,
            "Total PnL on full historical data: ${:.2}",
            strategy.total_pnl
        )?;
        Ok(())
    }
}

/// Write `results.txt`
pub fn write_results(path: &Path, report: &ResultsReport<'_>) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, report.to_string())?;
    log::info!("Wrote results to {}", path.display());
    Ok(())
}

/// Write the full monthly comparison and summary as JSON
pub fn write_summary_json(path: &Path, result: &BacktestResult) -> Result<()> {
    ensure_parent(path)?;
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

/// Write flagged price outliers as `ticker,date,price`
pub fn write_outliers(path: &Path, outliers: &[PriceOutlier]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["ticker", "date", "price"])?;
    for outlier in outliers {
        let date = outlier.date.format("%Y-%m-%d").to_string();
        let price = format!("{:.4}", outlier.price);
        writer.write_record([outlier.ticker.as_str(), date.as_str(), price.as_str()])?;
    }
    writer.flush()?;
    log::info!("Wrote {} price outliers to {}", outliers.len(), path.display());
    Ok(())
}

/// Write the cumulative PnL chart as SVG
pub fn write_chart(path: &Path, title: &str, series: &[ChartSeries]) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, render_pnl_chart(title, series))?;
    log::info!("Wrote chart to {}", path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
