//! Backtest outputs: summary statistics plus the optional trade tape.

use serde::{Deserialize, Serialize};

/// Aggregate statistics of one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub profit: f64,
    /// Profit as a percentage of the initial balance.
    pub profit_percentage: f64,
    /// Completed round trips (closing legs only).
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Percentage of completed trades that were winners; 0 with no trades.
    pub win_rate: f64,
}

impl BacktestResult {
    pub fn from_balances(
        initial_balance: f64,
        final_balance: f64,
        total_trades: usize,
        winning_trades: usize,
    ) -> Self {
        let profit = final_balance - initial_balance;
        let profit_percentage = profit / initial_balance * 100.0;
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };
        Self {
            initial_balance,
            final_balance,
            profit,
            profit_percentage,
            total_trades,
            winning_trades,
            win_rate,
        }
    }

    pub fn losing_trades(&self) -> usize {
        self.total_trades - self.winning_trades
    }
}

/// A completed buy → sell round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_index: usize,
    pub entry_time: i64,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: i64,
    pub exit_price: f64,
    pub units: f64,
    pub pnl: f64,
    pub is_win: bool,
}

impl ClosedTrade {
    /// Return on the trade as a fraction of entry price.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn steps_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Position still held when the series ended; valued at the final rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_time: i64,
    pub entry_price: f64,
    pub units: f64,
    pub cost: f64,
}

/// Summary plus the full trade tape and per-step equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub summary: BacktestResult,
    pub trades: Vec<ClosedTrade>,
    pub open_position: Option<OpenPosition>,
    /// Mark-to-market equity, one entry per input sample.
    pub equity_curve: Vec<f64>,
    pub rule: String,
}

impl BacktestRun {
    /// Largest peak-to-trough decline of the equity curve, as a fraction.
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = f64::MIN;
        let mut worst = 0.0_f64;
        for &equity in &self.equity_curve {
            peak = peak.max(equity);
            if peak > 0.0 {
                worst = worst.max((peak - equity) / peak);
            }
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_zero_without_trades() {
        let r = BacktestResult::from_balances(10_000.0, 10_500.0, 0, 0);
        assert_eq!(r.win_rate, 0.0);
        assert!((r.profit - 500.0).abs() < 1e-9);
        assert!((r.profit_percentage - 5.0).abs() < 1e-9);
    }

    #[test]
    fn win_rate_percentage() {
        let r = BacktestResult::from_balances(10_000.0, 9_000.0, 4, 1);
        assert!((r.win_rate - 25.0).abs() < 1e-9);
        assert_eq!(r.losing_trades(), 3);
        assert!((r.profit_percentage + 10.0).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_of_curve() {
        let run = BacktestRun {
            summary: BacktestResult::from_balances(100.0, 90.0, 0, 0),
            trades: Vec::new(),
            open_position: None,
            equity_curve: vec![100.0, 120.0, 90.0, 110.0],
            rule: "test".into(),
        };
        assert!((run.max_drawdown() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn closed_trade_return() {
        let t = ClosedTrade {
            entry_index: 3,
            entry_time: 0,
            entry_price: 100.0,
            exit_index: 8,
            exit_time: 5,
            exit_price: 110.0,
            units: 100.0,
            pnl: 1_000.0,
            is_win: true,
        };
        assert!((t.return_pct() - 0.1).abs() < 1e-12);
        assert_eq!(t.steps_held(), 5);
    }
}
