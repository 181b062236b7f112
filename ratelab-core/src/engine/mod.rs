//! Backtest simulator: replays a signal rule over an enriched series.
//!
//! Single all-in/all-out long position, no fees or slippage:
//!
//! 1. Derive an action from each consecutive pair of samples
//! 2. Apply it to the [`Ledger`] at the current rate
//! 3. Liquidate any open position at the final rate (accounting only)
//! 4. Summarize into a [`BacktestResult`]

pub mod ledger;
pub mod loop_runner;
pub mod result;

pub use ledger::{Ledger, StepEvent, INITIAL_BALANCE};
pub use loop_runner::{run_backtest, run_backtest_detailed, BacktestError, MIN_BACKTEST_SAMPLES};
pub use result::{BacktestResult, BacktestRun, ClosedTrade, OpenPosition};
