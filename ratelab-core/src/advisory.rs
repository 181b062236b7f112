//! Advisory seam: a qualitative BUY/SELL/HOLD judgment over recent samples.
//!
//! The live advisory service is external and non-deterministic; it plugs in
//! behind [`Advisor`]. Two local implementations ship with the engine:
//! [`RuleAdvisor`] applies the crossover rule to the latest pair of samples,
//! [`MockAdvisor`] answers HOLD when no service is configured.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Action, IndicatorSample};
use crate::signals::{MacdRsiRule, SignalRule};

/// Number of most recent samples handed to an advisor.
pub const CONTEXT_WINDOW: usize = 10;

const MOCK_RATIONALE: &str = "This is a mock response. Configure a live advisory service \
     to get model-generated signals.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("advisor needs at least {required} samples, got {available}")]
    InsufficientData { available: usize, required: usize },
    #[error("advisory service unavailable: {0}")]
    Unavailable(String),
}

/// An advisor's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorySignal {
    pub action: Action,
    pub rationale: String,
}

/// What an advisor gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    /// Latest samples, oldest first, at most [`CONTEXT_WINDOW`].
    pub recent: &'a [IndicatorSample],
}

impl<'a> AdvisoryContext<'a> {
    pub fn new(symbol: &'a str, timeframe: &'a str, samples: &'a [IndicatorSample]) -> Self {
        let start = samples.len().saturating_sub(CONTEXT_WINDOW);
        Self {
            symbol,
            timeframe,
            recent: &samples[start..],
        }
    }

    /// One line per indicator listing the recent values to two decimals.
    /// Undefined values render as `-`.
    pub fn indicator_digest(&self) -> String {
        format!(
            "RSI: {}\nMACD: {}\nSignal Line: {}",
            join_values(self.recent, |s| s.rsi),
            join_values(self.recent, |s| s.macd),
            join_values(self.recent, |s| s.signal_line)
        )
    }
}

fn join_values(samples: &[IndicatorSample], pick: fn(&IndicatorSample) -> Option<f64>) -> String {
    samples
        .iter()
        .map(|s| pick(s).map_or_else(|| "-".to_string(), |v| format!("{v:.2}")))
        .collect::<Vec<_>>()
        .join(", ")
}

pub trait Advisor: Send + Sync {
    fn advise(&self, ctx: &AdvisoryContext<'_>) -> Result<AdvisorySignal, AdvisoryError>;

    fn name(&self) -> &str;
}

/// Deterministic advisor backed by the crossover rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleAdvisor {
    pub rule: MacdRsiRule,
}

impl Advisor for RuleAdvisor {
    fn advise(&self, ctx: &AdvisoryContext<'_>) -> Result<AdvisorySignal, AdvisoryError> {
        let [.., previous, current] = ctx.recent else {
            return Err(AdvisoryError::InsufficientData {
                available: ctx.recent.len(),
                required: 2,
            });
        };

        let action = self.rule.evaluate(current, previous);
        let rationale = match (current.macd, current.signal_line, current.rsi) {
            (Some(macd), Some(signal), Some(rsi)) => {
                let cross = match action {
                    Action::Buy => "MACD crossed above its signal line",
                    Action::Sell => "MACD crossed below its signal line",
                    Action::Hold => "No qualifying MACD crossover",
                };
                format!(
                    "{cross} on {} {} (MACD {macd:.4}, signal {signal:.4}) with RSI at {rsi:.2}.",
                    ctx.symbol, ctx.timeframe
                )
            }
            _ => format!(
                "Indicators for {} {} are still warming up.",
                ctx.symbol, ctx.timeframe
            ),
        };

        Ok(AdvisorySignal { action, rationale })
    }

    fn name(&self) -> &str {
        "rule"
    }
}

/// Stand-in used when no live advisory service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAdvisor;

impl Advisor for MockAdvisor {
    fn advise(&self, _ctx: &AdvisoryContext<'_>) -> Result<AdvisorySignal, AdvisoryError> {
        Ok(AdvisorySignal {
            action: Action::Hold,
            rationale: MOCK_RATIONALE.to_string(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: i64, macd: f64, signal: f64, rsi: f64) -> IndicatorSample {
        IndicatorSample {
            time,
            rate: 10.0,
            rsi: Some(rsi),
            macd: Some(macd),
            signal_line: Some(signal),
        }
    }

    #[test]
    fn context_keeps_latest_window() {
        let samples: Vec<_> = (0..25).map(|i| sample(i, 0.0, 0.0, 50.0)).collect();
        let ctx = AdvisoryContext::new("BTC", "h1", &samples);
        assert_eq!(ctx.recent.len(), CONTEXT_WINDOW);
        assert_eq!(ctx.recent[0].time, 15);
        assert_eq!(ctx.recent[9].time, 24);
    }

    #[test]
    fn rule_advisor_reports_crossover() {
        let samples = vec![sample(0, -0.2, 0.0, 45.0), sample(1, 0.2, 0.0, 45.0)];
        let signal = RuleAdvisor::default()
            .advise(&AdvisoryContext::new("ETH", "h4", &samples))
            .unwrap();
        assert_eq!(signal.action, Action::Buy);
        assert!(signal.rationale.contains("crossed above"));
        assert!(signal.rationale.contains("ETH h4"));
    }

    #[test]
    fn rule_advisor_needs_two_samples() {
        let samples = vec![sample(0, 0.0, 0.0, 50.0)];
        let err = RuleAdvisor::default()
            .advise(&AdvisoryContext::new("BTC", "h1", &samples))
            .unwrap_err();
        assert_eq!(
            err,
            AdvisoryError::InsufficientData {
                available: 1,
                required: 2
            }
        );
    }

    #[test]
    fn mock_advisor_holds() {
        let signal = MockAdvisor
            .advise(&AdvisoryContext::new("BTC", "h1", &[]))
            .unwrap();
        assert_eq!(signal.action, Action::Hold);
        assert!(signal.rationale.contains("mock response"));
    }

    #[test]
    fn digest_marks_undefined_values() {
        let mut s = sample(0, 0.1234, 0.5, 55.555);
        s.rsi = None;
        let samples = [s];
        let digest = AdvisoryContext::new("BTC", "h1", &samples).indicator_digest();
        assert_eq!(digest, "RSI: -\nMACD: 0.12\nSignal Line: 0.50");
    }
}
