//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses over per-step deltas.
//! RSI = 100 - 100 / (1 + rs), rs = avg_gain / avg_loss.
//! Edge case: avg_loss == 0 → rs = 100, including the flat-series case where
//! avg_gain is also 0. The result is then 100 - 100/101, not 50.

use std::num::NonZeroUsize;

/// Relative strength used when the average loss is zero.
pub const ZERO_LOSS_STRENGTH: f64 = 100.0;

/// Compute sample-aligned RSI values.
///
/// The output has one entry per input rate. The value produced by delta `i`
/// (`rates[i+1] - rates[i]`) lands on sample `i + 1`. Sample 0 and the
/// `period` samples after it are `None` (warm-up).
pub fn wilder_rsi(rates: &[f64], period: NonZeroUsize) -> Vec<Option<f64>> {
    let n = rates.len();
    let mut result = vec![None; n];

    if n < 2 {
        return result;
    }

    let p = period.get();
    let pf = p as f64;

    let mut gains = vec![0.0; n - 1];
    let mut losses = vec![0.0; n - 1];
    for (i, w) in rates.windows(2).enumerate() {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    // Seed: mean over the first `period` deltas. A short series still divides
    // by `period`, and then never reaches the smoothing loop below.
    let mut avg_gain = gains.iter().take(p).sum::<f64>() / pf;
    let mut avg_loss = losses.iter().take(p).sum::<f64>() / pf;

    for (i, (&gain, &loss)) in gains.iter().zip(&losses).enumerate().skip(p) {
        avg_gain = (avg_gain * (pf - 1.0) + gain) / pf;
        avg_loss = (avg_loss * (pf - 1.0) + loss) / pf;
        result[i + 1] = Some(compute_rsi(avg_gain, avg_loss));
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        ZERO_LOSS_STRENGTH
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}
