//! Step-by-step backtest loop.
//!
//! For every step `i` in `1..len` the rule sees `(series[i], series[i-1])`
//! and the resulting action is applied to the [`Ledger`] at `series[i].rate`.
//! Steps are strictly sequential: each depends on the running position.

use thiserror::Error;
use tracing::debug;

use crate::domain::IndicatorSample;
use crate::signals::{MacdRsiRule, SignalRule};

use super::ledger::{Ledger, StepEvent, INITIAL_BALANCE};
use super::result::{BacktestResult, BacktestRun, ClosedTrade, OpenPosition};

/// Minimum series length a backtest accepts.
pub const MIN_BACKTEST_SAMPLES: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BacktestError {
    #[error("backtest needs at least {MIN_BACKTEST_SAMPLES} samples, got {len}")]
    InsufficientData { len: usize },
}

/// Run the default MACD/RSI strategy and return summary statistics.
pub fn run_backtest(series: &[IndicatorSample]) -> Result<BacktestResult, BacktestError> {
    run_backtest_detailed(series, &MacdRsiRule::default()).map(|run| run.summary)
}

/// Run `rule` over `series`, keeping the trade tape and equity curve.
pub fn run_backtest_detailed<R: SignalRule + ?Sized>(
    series: &[IndicatorSample],
    rule: &R,
) -> Result<BacktestRun, BacktestError> {
    let Some(last) = series.last() else {
        return Err(BacktestError::InsufficientData { len: 0 });
    };
    if series.len() < MIN_BACKTEST_SAMPLES {
        return Err(BacktestError::InsufficientData { len: series.len() });
    }

    let mut ledger = Ledger::new(INITIAL_BALANCE);
    let mut trades: Vec<ClosedTrade> = Vec::new();
    let mut open: Option<OpenPosition> = None;
    let mut equity_curve = Vec::with_capacity(series.len());
    equity_curve.push(ledger.equity(series[0].rate));

    for (i, pair) in series.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = i + 1;
        let action = rule.evaluate(current, previous);

        match ledger.apply(action, current.rate) {
            StepEvent::Bought { units, price, cost } => {
                debug!(index, price, units, "buy");
                open = Some(OpenPosition {
                    entry_index: index,
                    entry_time: current.time,
                    entry_price: price,
                    units,
                    cost,
                });
            }
            StepEvent::Sold {
                units,
                price,
                proceeds,
                entry_price,
                won,
            } => {
                debug!(index, price, proceeds, won, "sell");
                if let Some(entry) = open.take() {
                    trades.push(ClosedTrade {
                        entry_index: entry.entry_index,
                        entry_time: entry.entry_time,
                        entry_price,
                        exit_index: index,
                        exit_time: current.time,
                        exit_price: price,
                        units,
                        pnl: proceeds - entry.cost,
                        is_win: won,
                    });
                }
            }
            StepEvent::Unchanged => {}
        }

        equity_curve.push(ledger.equity(current.rate));
    }

    let summary = BacktestResult::from_balances(
        INITIAL_BALANCE,
        ledger.settle(last.rate),
        ledger.total_trades,
        ledger.winning_trades,
    );
    debug!(
        final_balance = summary.final_balance,
        total_trades = summary.total_trades,
        "backtest complete"
    );

    Ok(BacktestRun {
        summary,
        trades,
        open_position: open,
        equity_curve,
        rule: rule.name().to_string(),
    })
}
