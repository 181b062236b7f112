//! Signal generation: per-step BUY/SELL/HOLD from indicator samples.
//!
//! Signals must NEVER depend on simulation state (cash, holdings). They see
//! only the current and previous enriched samples.

pub mod rule;

pub use rule::{rule_signal, MacdRsiRule};

use crate::domain::{Action, IndicatorSample};

/// Portfolio-agnostic signal rule.
///
/// # Invariants
/// - `evaluate()` MUST be deterministic for the same pair of samples
/// - `evaluate()` returns `Action::Hold` whenever a required field is `None`
pub trait SignalRule: Send + Sync {
    fn evaluate(&self, current: &IndicatorSample, previous: &IndicatorSample) -> Action;

    /// Rule name for reports and logging.
    fn name(&self) -> &str;
}
