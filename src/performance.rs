//! Backtest evaluation against the benchmark
//!
//! Strategy: one unit in each selected ticker, so a month's PnL is the sum of
//! selected forward returns and its return is that PnL over the number of
//! selected tickers. Benchmark: a fixed `benchmark_unit` invested each month.
//! Both series are compared on the months they share only.
//!
//! Totals are additive sums of monthly figures, not compounded.

use crate::error::{BacktestError, Result};
use crate::types::{MonthlyRecord, Return};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Strategy figures for one month before alignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyMonth {
    pub date: NaiveDate,
    pub pnl: f64,
    pub selected: usize,
    pub monthly_return: Return,
}

/// One aligned month of the comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPnl {
    pub date: NaiveDate,
    pub selected: usize,
    pub strategy_pnl: f64,
    pub strategy_return: Return,
    pub strategy_cumulative_pnl: f64,
    pub benchmark_return: Return,
    pub benchmark_pnl: f64,
    pub benchmark_cumulative_pnl: f64,
}

/// Aggregate figures of one return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub total_return: f64,
    pub total_pnl: f64,
    pub mean_monthly_return: f64,
    pub monthly_volatility: f64,
    /// Largest peak-to-trough fall of cumulative PnL
    pub max_drawdown: f64,
}

impl SeriesSummary {
    fn from_series(returns: &[f64], cumulative_pnl: &[f64]) -> Self {
        let (mean, volatility) = if returns.len() < 2 {
            (returns.first().copied().unwrap_or(0.0), 0.0)
        } else {
            (returns.iter().mean(), returns.iter().std_dev())
        };

        Self {
            total_return: returns.iter().sum(),
            total_pnl: cumulative_pnl.last().copied().unwrap_or(0.0),
            mean_monthly_return: mean,
            monthly_volatility: volatility,
            max_drawdown: max_drawdown(cumulative_pnl),
        }
    }
}

/// Headline comparison of strategy and benchmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub months: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub strategy: SeriesSummary,
    pub benchmark: SeriesSummary,
    /// Strategy total return minus benchmark total return
    pub outperformance: f64,
}

impl std::fmt::Display for BacktestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Strategy Total Return: {:.4} ({:.2}%)",
            self.strategy.total_return,
            self.strategy.total_return * 100.0
        )?;
        writeln!(
            f,
            "Benchmark Total Return: {:.4} ({:.2}%)",
            self.benchmark.total_return,
            self.benchmark.total_return * 100.0
        )?;
        writeln!(f, "Outperformance: {:.2}%", self.outperformance * 100.0)?;
        writeln!(
            f,
            "Total PnL on full historical data: ${:.2}",
            self.strategy.total_pnl
        )?;
        Ok(())
    }
}

/// Monthly comparison plus its summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub months: Vec<MonthlyPnl>,
    pub summary: BacktestSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct BacktestEvaluator {
    benchmark_unit: f64,
}

impl BacktestEvaluator {
    pub fn new(benchmark_unit: f64) -> Self {
        Self { benchmark_unit }
    }

    /// Group signal rows by month.
    ///
    /// A month with no selected ticker has no defined return and is skipped.
    pub fn strategy_months(&self, records: &[MonthlyRecord]) -> Vec<StrategyMonth> {
        let mut months: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for record in records {
            let entry = months.entry(record.date).or_insert((0.0, 0));
            entry.0 += record.pnl();
            entry.1 += record.signal as usize;
        }

        months
            .into_iter()
            .filter_map(|(date, (pnl, selected))| {
                if selected == 0 {
                    log::debug!("{}: no tickers selected, month skipped", date);
                    return None;
                }
                Some(StrategyMonth {
                    date,
                    pnl,
                    selected,
                    monthly_return: pnl / selected as f64,
                })
            })
            .collect()
    }

    /// Compare the signal table against benchmark monthly returns
    pub fn evaluate(
        &self,
        records: &[MonthlyRecord],
        benchmark_returns: &BTreeMap<NaiveDate, Return>,
    ) -> Result<BacktestResult> {
        let strategy = self.strategy_months(records);

        let mut months = Vec::new();
        let mut strategy_cumulative = 0.0;
        let mut benchmark_cumulative = 0.0;

        for month in strategy {
            let Some(&benchmark_return) = benchmark_returns.get(&month.date) else {
                continue;
            };
            let benchmark_pnl = self.benchmark_unit * benchmark_return;
            strategy_cumulative += month.pnl;
            benchmark_cumulative += benchmark_pnl;

            months.push(MonthlyPnl {
                date: month.date,
                selected: month.selected,
                strategy_pnl: month.pnl,
                strategy_return: month.monthly_return,
                strategy_cumulative_pnl: strategy_cumulative,
                benchmark_return,
                benchmark_pnl,
                benchmark_cumulative_pnl: benchmark_cumulative,
            });
        }

        let (Some(first), Some(last)) = (months.first(), months.last()) else {
            return Err(BacktestError::NoOverlap);
        };

        let strategy_returns: Vec<f64> = months.iter().map(|m| m.strategy_return).collect();
        let strategy_cum: Vec<f64> = months.iter().map(|m| m.strategy_cumulative_pnl).collect();
        let benchmark_returns: Vec<f64> = months.iter().map(|m| m.benchmark_return).collect();
        let benchmark_cum: Vec<f64> = months.iter().map(|m| m.benchmark_cumulative_pnl).collect();

        let strategy = SeriesSummary::from_series(&strategy_returns, &strategy_cum);
        let benchmark = SeriesSummary::from_series(&benchmark_returns, &benchmark_cum);

        let summary = BacktestSummary {
            months: months.len(),
            start: first.date,
            end: last.date,
            strategy,
            benchmark,
            outperformance: strategy.total_return - benchmark.total_return,
        };

        log::info!(
            "Evaluated {} aligned months from {} to {}",
            summary.months,
            summary.start,
            summary.end
        );
        Ok(BacktestResult { months, summary })
    }
}

impl Default for BacktestEvaluator {
    fn default() -> Self {
        Self::new(20.0)
    }
}

/// Largest drop from a running peak of a cumulative PnL curve starting at zero
pub fn max_drawdown(cumulative_pnl: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in cumulative_pnl {
        peak = peak.max(value);
        max_dd = max_dd.max(peak - value);
    }
    max_dd
}
