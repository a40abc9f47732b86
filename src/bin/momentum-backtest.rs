//! momentum-backtest CLI
//!
//! ## Example Usage
//!
//! ```bash
//! # Run the full backtest with default paths (data/prices.csv, data/sp500.csv)
//! momentum-backtest run
//!
//! # Custom inputs and output directory
//! momentum-backtest run --prices prices.csv --benchmark sp500.csv --results-dir out
//!
//! # Only list raw price outliers
//! momentum-backtest outliers --prices prices.csv --limit 10
//! ```

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colored::Colorize;
use momentum_backtest::config::BacktestConfig;
use momentum_backtest::data::CsvTableLoader;
use momentum_backtest::engine::BacktestEngine;
use momentum_backtest::types::PriceObservation;
use std::path::{Path, PathBuf};
use std::process;

/// momentum-backtest: monthly momentum stock picking vs. a benchmark index
#[derive(Parser)]
#[command(name = "momentum-backtest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Monthly momentum stock-picking backtest", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backtest and write result files
    Run {
        /// Daily prices CSV (ticker, date, price)
        #[arg(short = 'p', long)]
        prices: Option<PathBuf>,

        /// Benchmark CSV (date, adj_close)
        #[arg(short = 'b', long)]
        benchmark: Option<PathBuf>,

        /// Directory for results.txt, summary.json and plots/
        #[arg(short = 'o', long)]
        results_dir: Option<PathBuf>,

        /// Skip the cumulative PnL chart
        #[arg(long)]
        no_chart: bool,
    },

    /// List interquartile-range price outliers of the raw input
    Outliers {
        /// Daily prices CSV
        #[arg(short = 'p', long)]
        prices: Option<PathBuf>,

        /// Maximum rows to print
        #[arg(short = 'l', long)]
        limit: Option<usize>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BacktestConfig> {
    if let Some(path) = path {
        return BacktestConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    // Fall back to the per-user config when present
    if let Some(home) = dirs::home_dir() {
        let default_config = home.join(".momentum-backtest").join("config.toml");
        if default_config.is_file() {
            return BacktestConfig::from_file(&default_config)
                .with_context(|| format!("Failed to load config {}", default_config.display()));
        }
    }

    Ok(BacktestConfig::default())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Run {
            prices,
            benchmark,
            results_dir,
            no_chart,
        } => run_backtest(config, prices, benchmark, results_dir, no_chart),
        Commands::Outliers { prices, limit } => list_outliers(config, prices, limit),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run_backtest(
    mut config: BacktestConfig,
    prices: Option<PathBuf>,
    benchmark: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    no_chart: bool,
) -> anyhow::Result<()> {
    if let Some(prices) = prices {
        config.prices_path = prices;
    }
    if let Some(benchmark) = benchmark {
        config.benchmark_path = benchmark;
    }
    if let Some(results_dir) = results_dir {
        config.results_dir = results_dir;
    }
    if no_chart {
        config.write_chart = false;
    }

    println!("{}", "Starting momentum backtest...".cyan().bold());
    let engine = BacktestEngine::new(config)?;
    let run = engine.run().context(
        "Backtest failed. Please add the data files to the data/ directory or pass --prices/--benchmark.",
    )?;

    print!("{}", run.result.summary);
    println!(
        "{} Check {} for outputs.",
        "Analysis complete!".green().bold(),
        engine.config().results_dir.display()
    );
    Ok(())
}

fn list_outliers(
    mut config: BacktestConfig,
    prices: Option<PathBuf>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(prices) = prices {
        config.prices_path = prices;
    }
    if let Some(limit) = limit {
        config.outlier_report_limit = limit;
    }

    let table = CsvTableLoader::new().load_prices(&config.prices_path)?;
    let observations: Vec<PriceObservation> = table.observations().collect();
    let engine = BacktestEngine::new(config)?;

    println!("{}", "ticker,date,price".bold());
    for outlier in engine.price_outliers(&observations) {
        println!("{},{},{:.4}", outlier.ticker, outlier.date, outlier.price);
    }
    Ok(())
}
