//! Indicator calculation over a single rate series.
//!
//! `calculate_indicators` is the entry point: it computes Wilder RSI and the
//! 12/26/9 MACD over the raw rates, merges them onto a copy of the series and
//! drops the first [`WARMUP_TRIM`] rows, where the slow EMA has not yet
//! absorbed a full window.

pub mod ema;
pub mod macd;
pub mod rsi;

use std::num::NonZeroUsize;

use crate::domain::{IndicatorSample, RawSample};

pub use ema::ema_of_series;
pub use macd::{macd, MacdLines};
pub use rsi::wilder_rsi;

/// Leading rows removed from every calculated series. Fixed; independent of
/// the RSI period.
pub const WARMUP_TRIM: usize = macd::SLOW_SPAN;

/// Default RSI smoothing period.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Enrich a raw series with RSI, MACD and signal line, then trim warm-up rows.
///
/// Output length is `series.len().saturating_sub(WARMUP_TRIM)`. Every returned
/// sample carries MACD and signal line; RSI is `None` only where the series is
/// too short for `period`. An empty result means "insufficient data".
pub fn calculate_indicators(series: &[RawSample], period: NonZeroUsize) -> Vec<IndicatorSample> {
    if series.len() <= WARMUP_TRIM {
        return Vec::new();
    }

    let rates: Vec<f64> = series.iter().map(|s| s.rate).collect();
    let rsi = wilder_rsi(&rates, period);
    let lines = macd(&rates);

    series
        .iter()
        .zip(rsi)
        .zip(lines.macd.iter().zip(&lines.signal))
        .skip(WARMUP_TRIM)
        .map(|((raw, rsi), (&macd, &signal_line))| IndicatorSample {
            time: raw.time,
            rate: raw.rate,
            rsi,
            macd: Some(macd),
            signal_line: Some(signal_line),
        })
        .collect()
}

/// Build an hourly raw series from rates, for tests and benches.
#[cfg(test)]
pub fn make_samples(rates: &[f64]) -> Vec<RawSample> {
    const HOUR_MS: i64 = 60 * 60 * 1000;
    rates
        .iter()
        .enumerate()
        .map(|(i, &rate)| RawSample::new(1_700_000_000_000 + i as i64 * HOUR_MS, rate))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
