//! End-to-end tests for the momentum backtest

use approx::assert_relative_eq;
use chrono::NaiveDate;
use momentum_backtest::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const TICKERS: usize = 25;
const MONTHS: u32 = 12;

/// Ticker `Tii` grows by `0.002 * i` per month; two quotes per month.
fn write_fixture(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let mut prices = String::from("date,ticker,price,volume\n");
    for month in 1..=MONTHS {
        for i in 0..TICKERS {
            let growth = 1.0 + 0.002 * i as f64;
            let end_price = 10.0 * growth.powi(month as i32);
            let _ = writeln!(prices, "2010-{:02}-05,T{:02},{},1000", month, i, end_price * 0.97);
            let _ = writeln!(prices, "2010-{:02}-20,T{:02},{},1000", month, i, end_price);
        }
    }

    let mut benchmark = String::from("date,adj_close\n");
    for month in 1..=MONTHS {
        let _ = writeln!(benchmark, "2010-{:02}-20,{}", month, 100.0 * 1.01_f64.powi(month as i32));
    }

    let prices_path = dir.join("prices.csv");
    let benchmark_path = dir.join("sp500.csv");
    fs::write(&prices_path, prices).unwrap();
    fs::write(&benchmark_path, benchmark).unwrap();
    (prices_path, benchmark_path)
}

fn config_for(dir: &Path) -> BacktestConfig {
    let (prices_path, benchmark_path) = write_fixture(dir);
    BacktestConfig {
        prices_path,
        benchmark_path,
        results_dir: dir.join("results"),
        ..BacktestConfig::default()
    }
}

#[test]
fn test_full_run_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let results_dir = config.results_dir.clone();

    let run = BacktestEngine::new(config).unwrap().run().unwrap();
    let summary = run.result.summary;

    // Feb..Nov survive cleaning; the benchmark has returns Feb..Dec
    assert_eq!(summary.months, 10);
    assert_eq!(summary.start, NaiveDate::from_ymd_opt(2010, 2, 28).unwrap());
    assert_eq!(summary.end, NaiveDate::from_ymd_opt(2010, 11, 30).unwrap());

    // Top 20 are T05..T24, mean monthly growth 0.002 * 14.5
    assert_relative_eq!(summary.strategy.total_return, 0.29, epsilon = 1e-9);
    assert_relative_eq!(summary.strategy.total_pnl, 5.8, epsilon = 1e-9);
    assert_relative_eq!(summary.benchmark.total_return, 0.10, epsilon = 1e-9);
    assert_relative_eq!(summary.benchmark.total_pnl, 2.0, epsilon = 1e-9);
    assert_relative_eq!(summary.outperformance, 0.19, epsilon = 1e-9);

    for month in &run.result.months {
        assert_eq!(month.selected, 20);
    }
    assert!(run
        .signals
        .iter()
        .filter(|r| r.signal)
        .all(|r| r.ticker.as_str() >= "T05"));

    let text = fs::read_to_string(results_dir.join("results.txt")).unwrap();
    assert!(text.starts_with("BACKTESTING RESULTS\n==================\n\n"));
    assert!(text.contains("Stock Picking Strategy (Top 20):\nTotal Return: 0.2900 (29.00%)\nPnL: $5.80\n"));
    assert!(text.contains("S&P 500 Benchmark:\nTotal Return: 0.1000 (10.00%)\nPnL: $2.00\n"));
    assert!(text.contains("Outperformance: 19.00%\n"));

    assert!(results_dir.join("summary.json").is_file());
    assert!(results_dir.join("outliers.txt").is_file());
    let svg_path = results_dir.join("plots").join("strategy_performance.svg");
    let svg = fs::read_to_string(svg_path).unwrap();
    assert_eq!(svg.matches("<polyline").count(), 2);
}

#[test]
fn test_missing_input_aborts_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let config = BacktestConfig {
        prices_path: dir.path().join("missing.csv"),
        benchmark_path: dir.path().join("sp500.csv"),
        results_dir: dir.path().join("results"),
        ..BacktestConfig::default()
    };

    let err = BacktestEngine::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, BacktestError::MissingInput(_)));
    assert!(!dir.path().join("results").exists());
}

#[test]
fn test_chart_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = BacktestConfig {
        write_chart: false,
        ..config_for(dir.path())
    };
    let results_dir = config.results_dir.clone();

    BacktestEngine::new(config).unwrap().run().unwrap();
    assert!(results_dir.join("results.txt").is_file());
    assert!(!results_dir.join("plots").exists());
}

#[test]
fn test_preprocessing_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let table = CsvTableLoader::new().load_prices(&config.prices_path).unwrap();
    let engine = BacktestEngine::new(config).unwrap();

    let first = engine.preprocess(table.observations()).unwrap();
    let second = engine.preprocess(table.observations()).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_crisis_moves_survive_cleaning() {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    let observations = vec![
        PriceObservation::new("AAA", date(2007, 11, 30), 10.0),
        PriceObservation::new("AAA", date(2007, 12, 31), 10.0),
        PriceObservation::new("AAA", date(2008, 1, 31), 30.0),
        PriceObservation::new("AAA", date(2008, 2, 29), 31.0),
        PriceObservation::new("AAA", date(2010, 1, 29), 31.0),
        PriceObservation::new("AAA", date(2010, 2, 26), 93.0),
        PriceObservation::new("AAA", date(2010, 3, 31), 94.0),
    ];

    let cleaned = Preprocessor::default().run(observations);
    let rows = &cleaned["AAA"];

    // December 2007's forward move of +200% is outside the window and dropped
    assert!(rows.iter().all(|r| r.date != date(2007, 12, 31)));

    // January 2008 keeps its +200% trailing return
    let jan = rows.iter().find(|r| r.date == date(2008, 1, 31)).unwrap();
    assert_relative_eq!(jan.trailing_return, 2.0, epsilon = 1e-12);

    // February 2010's +200% trailing return is replaced by January 2010's
    let feb = rows.iter().find(|r| r.date == date(2010, 2, 28)).unwrap();
    assert_relative_eq!(feb.trailing_return, 0.0, epsilon = 1e-12);
}

#[test]
fn test_custom_labels_reach_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = BacktestConfig {
        strategy_label: "Momentum <Q>".to_string(),
        benchmark_label: "Russell 1000".to_string(),
        ..config_for(dir.path())
    };
    let results_dir = config.results_dir.clone();

    BacktestEngine::new(config).unwrap().run().unwrap();

    let text = fs::read_to_string(results_dir.join("results.txt")).unwrap();
    assert!(text.contains("Momentum <Q> (Top 20):\nTotal Return: 0.2900"));
    assert!(text.contains("Russell 1000 Benchmark:\n"));
    assert!(!text.contains("Stock Picking Strategy"));

    let svg_path = results_dir.join("plots").join("strategy_performance.svg");
    let svg = fs::read_to_string(svg_path).unwrap();
    assert!(svg.contains("Momentum &lt;Q&gt; (Top 20)"));
    assert!(svg.contains("Strategy Performance vs Russell 1000 Benchmark"));
}

#[test]
fn test_missing_price_tokens_fall_back_to_earlier_quote() {
    let csv = "\
ticker,date,price
AAA,2010-01-05,10
AAA,2010-01-29,-nan
AAA,2010-02-26,11
AAA,2010-03-31,NA
AAA,2010-03-31,12
AAA,2010-04-30,13
";
    let table = CsvTableLoader::new().read_prices(csv.as_bytes()).unwrap();
    assert_eq!(table.skipped_rows(), 2);

    let cleaned = Preprocessor::default().run(table.observations());
    let dates: Vec<NaiveDate> = cleaned["AAA"].iter().map(|r| r.date).collect();

    // January keeps its 10.0 quote, so February has a trailing return
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2010, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2010, 3, 31).unwrap(),
        ]
    );
    assert_relative_eq!(cleaned["AAA"][0].trailing_return, 0.1, epsilon = 1e-12);
}
