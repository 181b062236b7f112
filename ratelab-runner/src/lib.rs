//! RateLab Runner: settings, market feeds, the analysis pipeline, sweeps, export.
//!
//! This crate builds on `ratelab-core` to provide:
//! - TOML run configuration with validated trading settings
//! - Synthetic (seeded) and CSV market feeds
//! - The analyze → backtest pipeline with its minimum-data preconditions
//! - Parallel multi-symbol sweeps with deterministic ranking
//! - JSON/CSV/Markdown artifact export

pub mod config;
pub mod export;
pub mod feed;
pub mod pipeline;
pub mod sweep;

pub use config::{
    normalize_symbol, AdvisorKind, ConfigError, LogFormat, LoggingConfig, RunConfig,
    SettingsOverrides, SweepConfig, Timeframe, TradingSettings, SYMBOLS,
};
pub use feed::{CsvFeed, FeedError, MarketFeed, SyntheticFeed};
pub use pipeline::{
    advisor_for, analyze, backtest, run_pipeline, Analysis, BacktestReport, PipelineError,
    SCHEMA_VERSION,
};
pub use sweep::{SweepEntry, SymbolSweep};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<TradingSettings>();
        assert_sync::<TradingSettings>();
    }

    #[test]
    fn feeds_are_send_sync() {
        assert_send::<SyntheticFeed>();
        assert_sync::<SyntheticFeed>();
        assert_send::<CsvFeed>();
        assert_sync::<CsvFeed>();
    }

    #[test]
    fn reports_are_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<SweepEntry>();
        assert_sync::<SweepEntry>();
    }
}
