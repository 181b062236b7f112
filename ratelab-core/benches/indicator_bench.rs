//! Criterion benchmarks for RateLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator calculation (RSI + MACD + trim) over growing series
//! 2. Backtest loop over a pre-calculated series, summary and detailed

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::num::NonZeroUsize;

use ratelab_core::engine::run_backtest_detailed;
use ratelab_core::indicators::ema_of_series;
use ratelab_core::signals::MacdRsiRule;
use ratelab_core::{calculate_indicators, run_backtest, RawSample};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_samples(n: usize) -> Vec<RawSample> {
    (0..n)
        .map(|i| {
            let rate = 15.0 + (i as f64 * 0.1).sin() * 5.0 + (i as f64 * 0.37).cos() * 0.4;
            RawSample::new(i as i64 * 3_600_000, rate)
        })
        .collect()
}

fn period() -> NonZeroUsize {
    NonZeroUsize::new(14).unwrap()
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_indicators");

    for &n in &[720, 2_880, 17_520] {
        let samples = make_samples(n);
        group.bench_with_input(BenchmarkId::new("rsi14_macd", n), &n, |b, _| {
            b.iter(|| calculate_indicators(black_box(&samples), period()))
        });
    }

    let rates: Vec<f64> = make_samples(17_520).iter().map(|s| s.rate).collect();
    group.bench_function("ema26_only", |b| {
        b.iter(|| ema_of_series(black_box(&rates), 26))
    });

    group.finish();
}

// ── 2. Backtest loop ─────────────────────────────────────────────────

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest");

    for &n in &[720, 2_880, 17_520] {
        let series = calculate_indicators(&make_samples(n), period());
        group.bench_with_input(BenchmarkId::new("summary", n), &n, |b, _| {
            b.iter(|| run_backtest(black_box(&series)))
        });
        group.bench_with_input(BenchmarkId::new("detailed", n), &n, |b, _| {
            b.iter(|| run_backtest_detailed(black_box(&series), &MacdRsiRule::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_backtest);
criterion_main!(benches);
