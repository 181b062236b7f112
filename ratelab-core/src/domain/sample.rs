//! Rate samples: the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// A single timestamped rate observation.
///
/// `time` is milliseconds since the Unix epoch. A series is ordered by
/// non-decreasing `time`, one sample per timeframe step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub time: i64,
    pub rate: f64,
}

impl RawSample {
    pub fn new(time: i64, rate: f64) -> Self {
        Self { time, rate }
    }
}

/// A raw sample enriched with indicator values.
///
/// `None` means the indicator is still inside its warm-up window. It is never
/// used as a stand-in for a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSample {
    pub time: i64,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_line: Option<f64>,
}

impl IndicatorSample {
    /// MACD minus signal line, if both are defined.
    pub fn histogram(&self) -> Option<f64> {
        Some(self.macd? - self.signal_line?)
    }

    /// True once every indicator field has left its warm-up window.
    pub fn is_complete(&self) -> bool {
        self.rsi.is_some() && self.macd.is_some() && self.signal_line.is_some()
    }
}

impl From<RawSample> for IndicatorSample {
    fn from(raw: RawSample) -> Self {
        Self {
            time: raw.time,
            rate: raw.rate,
            ..Self::default()
        }
    }
}

/// Returns the index of the first sample whose time is earlier than its
/// predecessor's, if any.
pub fn first_unordered(series: &[RawSample]) -> Option<usize> {
    series
        .windows(2)
        .position(|w| w[1].time < w[0].time)
        .map(|i| i + 1)
}
