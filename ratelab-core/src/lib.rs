//! RateLab Core: rate samples, indicators, signal rule, backtest simulator.
//!
//! This crate contains the pure computational heart of RateLab:
//! - Domain types (raw and indicator-enriched rate samples, actions)
//! - Indicator calculator (EMA, Wilder RSI, MACD with signal line)
//! - MACD/RSI crossover signal rule
//! - All-in/all-out backtest simulator with an explicit ledger
//! - Advisory seam for external BUY/SELL/HOLD oracles
//!
//! Nothing here performs I/O; every function is deterministic for its input.

pub mod advisory;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;

pub use domain::{Action, IndicatorSample, RawSample};
pub use engine::{run_backtest, run_backtest_detailed, BacktestError, BacktestResult, BacktestRun};
pub use indicators::calculate_indicators;
pub use signals::rule_signal;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can cross threads, so independent
    /// series can be processed in parallel.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RawSample>();
        require_sync::<RawSample>();
        require_send::<IndicatorSample>();
        require_sync::<IndicatorSample>();
        require_send::<Action>();
        require_sync::<Action>();

        require_send::<BacktestResult>();
        require_sync::<BacktestResult>();
        require_send::<BacktestRun>();
        require_sync::<BacktestRun>();
        require_send::<engine::Ledger>();
        require_sync::<engine::Ledger>();
        require_send::<BacktestError>();
        require_sync::<BacktestError>();

        require_send::<signals::MacdRsiRule>();
        require_sync::<signals::MacdRsiRule>();
        require_send::<advisory::RuleAdvisor>();
        require_sync::<advisory::RuleAdvisor>();
        require_send::<advisory::MockAdvisor>();
        require_sync::<advisory::MockAdvisor>();
        require_send::<advisory::AdvisorySignal>();
        require_sync::<advisory::AdvisorySignal>();
    }

    /// Architecture contract: SignalRule does NOT see simulation state.
    ///
    /// `evaluate()` takes two samples and nothing else. Adding a ledger
    /// parameter breaks every implementation, which is the point.
    #[test]
    fn signal_rule_has_no_ledger_parameter() {
        fn _check_trait_object_builds(
            rule: &dyn signals::SignalRule,
            current: &IndicatorSample,
            previous: &IndicatorSample,
        ) -> Action {
            rule.evaluate(current, previous)
        }
    }
}
