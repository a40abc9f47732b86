//! Backtest driver: input files to result files in one synchronous run

use crate::config::BacktestConfig;
use crate::data::benchmarks::{monthly_benchmark, BenchmarkSeries};
use crate::data::loader::{ensure_exists, BenchmarkTable, CsvTableLoader, PriceTable};
use crate::error::Result;
use crate::performance::{BacktestEvaluator, BacktestResult};
use crate::pipeline::filters::{iqr_price_outliers, PriceOutlier};
use crate::pipeline::{Preprocessor, SignalBuilder};
use crate::report::chart::{ChartSeries, BENCHMARK_COLOR, STRATEGY_COLOR};
use crate::report::{
    write_chart, write_outliers, write_results, write_summary_json, ResultsReport,
};
use crate::types::{CleanRecord, MonthlyRecord, PriceObservation, TickerSeries};

/// Per-ticker cap on rows taken by the IQR diagnostic
const OUTLIERS_PER_TICKER: usize = 5;

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub signals: Vec<MonthlyRecord>,
    pub benchmark: BenchmarkSeries,
    pub outliers: Vec<PriceOutlier>,
    pub result: BacktestResult,
}

/// Runs the full pipeline for one configuration
pub struct BacktestEngine {
    config: BacktestConfig,
    loader: CsvTableLoader,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader: CsvTableLoader::new(),
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Load inputs, run the pipeline and write every result file
    pub fn run(&self) -> Result<BacktestRun> {
        // Both inputs must exist before anything is loaded
        ensure_exists(&self.config.prices_path)?;
        ensure_exists(&self.config.benchmark_path)?;

        log::info!("Loading and optimizing data...");
        let prices = self.loader.load_prices(&self.config.prices_path)?;
        let benchmark = self.loader.load_benchmark(&self.config.benchmark_path)?;

        let run = self.run_tables(&prices, &benchmark)?;
        self.write_outputs(&run)?;
        Ok(run)
    }

    /// Pipeline over already loaded tables, without touching the filesystem
    pub fn run_tables(
        &self,
        prices: &PriceTable,
        benchmark: &BenchmarkTable,
    ) -> Result<BacktestRun> {
        log::info!(
            "Prices data: {} rows, benchmark data: {} rows",
            prices.len(),
            benchmark.len()
        );

        let observations: Vec<PriceObservation> = prices.observations().collect();
        let outliers = self.price_outliers(&observations);

        log::info!("Preprocessing data...");
        let cleaned = self.preprocess(observations)?;
        let benchmark = monthly_benchmark(benchmark);
        log::info!("Processed benchmark: {} months", benchmark.len());

        log::info!("Creating investment signal...");
        let signals =
            SignalBuilder::new(self.config.top_n, self.config.rolling_window).build(&cleaned);

        log::info!("Running backtest...");
        let result = BacktestEvaluator::new(self.config.benchmark_unit)
            .evaluate(&signals, &benchmark.returns())?;

        log::info!(
            "Strategy total return {:.4}, benchmark total return {:.4}",
            result.summary.strategy.total_return,
            result.summary.benchmark.total_return
        );

        Ok(BacktestRun {
            signals,
            benchmark,
            outliers,
            result,
        })
    }

    /// Resample, compute returns and clean
    pub fn preprocess<I>(&self, observations: I) -> Result<TickerSeries<CleanRecord>>
    where
        I: IntoIterator<Item = PriceObservation>,
    {
        Ok(Preprocessor::from_config(&self.config)?.run(observations))
    }

    /// IQR diagnostic limited to the configured report size
    pub fn price_outliers(&self, observations: &[PriceObservation]) -> Vec<PriceOutlier> {
        let mut outliers = iqr_price_outliers(observations, OUTLIERS_PER_TICKER);
        outliers.truncate(self.config.outlier_report_limit);
        outliers
    }

    fn write_outputs(&self, run: &BacktestRun) -> Result<()> {
        let config = &self.config;
        let summary = &run.result.summary;

        write_outliers(&config.outliers_file(), &run.outliers)?;
        let strategy_title = config.strategy_title();
        let benchmark_title = config.benchmark_title();
        write_results(
            &config.results_file(),
            &ResultsReport {
                summary,
                strategy_title: &strategy_title,
                benchmark_title: &benchmark_title,
            },
        )?;
        write_summary_json(&config.summary_file(), &run.result)?;

        if config.write_chart {
            let months = &run.result.months;
            let series = [
                ChartSeries {
                    label: strategy_title.clone(),
                    color: STRATEGY_COLOR,
                    points: months
                        .iter()
                        .map(|m| (m.date, m.strategy_cumulative_pnl))
                        .collect(),
                },
                ChartSeries {
                    label: benchmark_title.clone(),
                    color: BENCHMARK_COLOR,
                    points: months
                        .iter()
                        .map(|m| (m.date, m.benchmark_cumulative_pnl))
                        .collect(),
                },
            ];
            let title = format!("Strategy Performance vs {}", benchmark_title);
            write_chart(&config.chart_file(), &title, &series)?;
        }

        Ok(())
    }
}
