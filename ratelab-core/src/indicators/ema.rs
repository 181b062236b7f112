//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = k * x[t] + (1 - k) * EMA[t-1], with k = 2 / (span + 1).
//! Seed: EMA[0] = x[0]. Defined from the first sample onward, no lookback gap.

/// Smoothing constant for a given span.
pub fn smoothing(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Compute EMA values over a pre-extracted f64 slice.
///
/// Single left-to-right pass. An empty slice yields an empty vector.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let Some(&seed) = values.first() else {
        return Vec::new();
    };

    let k = smoothing(span);
    let mut result = Vec::with_capacity(values.len());
    result.push(seed);

    let mut prev = seed;
    for &value in &values[1..] {
        let ema = value * k + prev * (1.0 - k);
        result.push(ema);
        prev = ema;
    }

    result
}
