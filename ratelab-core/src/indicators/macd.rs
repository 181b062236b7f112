//! MACD: fast EMA minus slow EMA, plus a signal-line EMA of the difference.
//!
//! Both EMAs are seeded on the first rate, so the MACD and signal lines are
//! defined on every sample. Early values are unreliable; the calculator trims
//! them instead of marking them absent.

use super::ema::ema_of_series;

pub const FAST_SPAN: usize = 12;
pub const SLOW_SPAN: usize = 26;
pub const SIGNAL_SPAN: usize = 9;

/// MACD and signal line, index-aligned with the input rates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdLines {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}

/// Standard 12/26/9 MACD.
pub fn macd(rates: &[f64]) -> MacdLines {
    macd_with_spans(rates, FAST_SPAN, SLOW_SPAN, SIGNAL_SPAN)
}

pub fn macd_with_spans(rates: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let fast_ema = ema_of_series(rates, fast);
    let slow_ema = ema_of_series(rates, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_of_series(&macd, signal);

    MacdLines { macd, signal }
}
