//! MACD crossover rule gated by RSI.
//!
//! BUY when MACD crosses above its signal line and RSI is below the
//! overbought level; SELL when MACD crosses below and RSI is above the
//! oversold level. The BUY branch is evaluated first and wins if both
//! crossings ever hold in the same step.

use serde::{Deserialize, Serialize};

use super::SignalRule;
use crate::domain::{Action, IndicatorSample};

pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdRsiRule {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for MacdRsiRule {
    fn default() -> Self {
        Self {
            overbought: OVERBOUGHT,
            oversold: OVERSOLD,
        }
    }
}

impl SignalRule for MacdRsiRule {
    fn evaluate(&self, current: &IndicatorSample, previous: &IndicatorSample) -> Action {
        let (Some(cur_macd), Some(cur_signal), Some(prev_macd), Some(prev_signal), Some(rsi)) = (
            current.macd,
            current.signal_line,
            previous.macd,
            previous.signal_line,
            current.rsi,
        ) else {
            return Action::Hold;
        };

        let crossed_up = prev_macd <= prev_signal && cur_macd > cur_signal;
        let crossed_down = prev_macd >= prev_signal && cur_macd < cur_signal;

        if crossed_up && rsi < self.overbought {
            return Action::Buy;
        }
        if crossed_down && rsi > self.oversold {
            return Action::Sell;
        }
        Action::Hold
    }

    fn name(&self) -> &str {
        "macd_rsi"
    }
}

/// Evaluate the default 70/30 rule on a pair of consecutive samples.
pub fn rule_signal(current: &IndicatorSample, previous: &IndicatorSample) -> Action {
    MacdRsiRule::default().evaluate(current, previous)
}
