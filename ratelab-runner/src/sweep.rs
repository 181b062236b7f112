//! Multi-symbol sweep: the same settings backtested across many symbols.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ratelab_core::advisory::Advisor;
use ratelab_core::BacktestResult;

use crate::config::TradingSettings;
use crate::feed::MarketFeed;
use crate::pipeline::run_pipeline;

/// One symbol's outcome. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub symbol: String,
    pub result: Option<BacktestResult>,
    pub error: Option<String>,
}

impl SweepEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }
}

/// Runs the analyze + backtest pipeline for every symbol, optionally in parallel.
///
/// Each symbol derives its own series from the base settings, so results
/// do not depend on execution order.
pub struct SymbolSweep<'a> {
    feed: &'a dyn MarketFeed,
    advisor: &'a dyn Advisor,
    parallel: bool,
}

impl<'a> SymbolSweep<'a> {
    pub fn new(feed: &'a dyn MarketFeed, advisor: &'a dyn Advisor) -> Self {
        Self {
            feed,
            advisor,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns entries ranked by profit percentage (descending, ties by
    /// symbol), with failed symbols after all successes.
    pub fn run(&self, base: &TradingSettings, symbols: &[String]) -> Vec<SweepEntry> {
        let mut entries: Vec<SweepEntry> = if self.parallel {
            symbols.par_iter().map(|s| self.run_one(base, s)).collect()
        } else {
            symbols.iter().map(|s| self.run_one(base, s)).collect()
        };
        rank(&mut entries);

        let failed = entries.iter().filter(|e| !e.is_ok()).count();
        info!(symbols = entries.len(), failed, "sweep complete");
        entries
    }

    fn run_one(&self, base: &TradingSettings, symbol: &str) -> SweepEntry {
        let settings = base.for_symbol(symbol);
        match run_pipeline(&settings, self.feed, self.advisor) {
            Ok(report) => SweepEntry {
                symbol: symbol.to_string(),
                result: Some(report.run.summary),
                error: None,
            },
            Err(err) => {
                warn!(symbol, error = %err, "symbol failed");
                SweepEntry {
                    symbol: symbol.to_string(),
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

fn rank(entries: &mut [SweepEntry]) {
    entries.sort_by(|a, b| match (&a.result, &b.result) {
        (Some(ra), Some(rb)) => rb
            .profit_percentage
            .total_cmp(&ra.profit_percentage)
            .then_with(|| a.symbol.cmp(&b.symbol)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.symbol.cmp(&b.symbol),
    });
}
