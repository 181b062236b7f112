//! Ledger: the simulation state threaded through the backtest loop.
//!
//! All-in/all-out, long only: at any step the balance sits entirely in cash
//! or entirely in holdings. Only the closing leg of a round trip counts as a
//! trade.

use serde::{Deserialize, Serialize};

use crate::domain::Action;

/// Starting cash for every backtest.
pub const INITIAL_BALANCE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub cash: f64,
    /// Asset units held.
    pub holdings: f64,
    /// Rate of the open position's entry; 0 when flat.
    pub last_buy_price: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
}

/// What a single step did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEvent {
    Bought {
        units: f64,
        price: f64,
        cost: f64,
    },
    Sold {
        units: f64,
        price: f64,
        proceeds: f64,
        entry_price: f64,
        won: bool,
    },
    Unchanged,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash: initial_balance,
            holdings: 0.0,
            last_buy_price: 0.0,
            total_trades: 0,
            winning_trades: 0,
        }
    }

    pub fn in_position(&self) -> bool {
        self.holdings > 0.0
    }

    /// Apply one action at `rate`.
    ///
    /// BUY needs cash, SELL needs holdings; anything else leaves the ledger
    /// untouched. BUY is checked first.
    pub fn apply(&mut self, action: Action, rate: f64) -> StepEvent {
        if action == Action::Buy && self.cash > 0.0 {
            let cost = self.cash;
            self.holdings = cost / rate;
            self.last_buy_price = rate;
            self.cash = 0.0;
            return StepEvent::Bought {
                units: self.holdings,
                price: rate,
                cost,
            };
        }

        if action == Action::Sell && self.holdings > 0.0 {
            let units = self.holdings;
            let entry_price = self.last_buy_price;
            let won = rate > entry_price;
            self.cash = units * rate;
            self.holdings = 0.0;
            self.total_trades += 1;
            if won {
                self.winning_trades += 1;
            }
            self.last_buy_price = 0.0;
            return StepEvent::Sold {
                units,
                price: rate,
                proceeds: self.cash,
                entry_price,
                won,
            };
        }

        StepEvent::Unchanged
    }

    /// Mark-to-market value at `rate`.
    pub fn equity(&self, rate: f64) -> f64 {
        self.cash + self.holdings * rate
    }

    /// Closing balance: cash if any, otherwise holdings liquidated at `rate`.
    ///
    /// Accounting only, trade counters are not touched.
    pub fn settle(&self, rate: f64) -> f64 {
        if self.cash > 0.0 {
            self.cash
        } else {
            self.holdings * rate
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(INITIAL_BALANCE)
    }
}
