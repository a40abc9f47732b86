use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use momentum_backtest::{
    performance::BacktestEvaluator,
    pipeline::{Preprocessor, SignalBuilder},
    types::PriceObservation,
};
use std::collections::BTreeMap;

/// 100 tickers with ten years of weekday quotes
fn synthetic_prices() -> Vec<PriceObservation> {
    let start = NaiveDate::from_ymd_opt(2005, 1, 3).unwrap();
    let mut observations = Vec::new();

    for t in 0..100 {
        let ticker = format!("T{:03}", t);
        let drift = 1.0 + (t as f64 - 50.0) / 100_000.0;
        let mut price = 20.0 + t as f64;
        for day in 0..(365 * 10) {
            let date = start + Duration::days(day);
            price *= drift;
            observations.push(PriceObservation::new(ticker.clone(), date, price));
        }
    }
    observations
}

fn benchmark_pipeline(c: &mut Criterion) {
    let observations = synthetic_prices();

    c.bench_function("preprocess_100_tickers_10y", |b| {
        b.iter(|| Preprocessor::default().run(black_box(observations.clone())))
    });

    let cleaned = Preprocessor::default().run(observations);
    c.bench_function("signal_100_tickers_10y", |b| {
        b.iter(|| SignalBuilder::default().build(black_box(&cleaned)))
    });

    let signals = SignalBuilder::default().build(&cleaned);
    let benchmark: BTreeMap<NaiveDate, f64> = signals.iter().map(|r| (r.date, 0.01)).collect();
    c.bench_function("evaluate_100_tickers_10y", |b| {
        b.iter(|| BacktestEvaluator::default().evaluate(black_box(&signals), &benchmark))
    });
}

criterion_group!(benches, benchmark_pipeline);
criterion_main!(benches);
