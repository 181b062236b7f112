//! Analysis pipeline: settings → feed → indicators → advisory → backtest.
//!
//! Two entry points:
//! - `analyze()`: fetches the series, enriches it, and asks the advisor for a
//!   headline signal. Enforces the minimum-data preconditions.
//! - `backtest()`: replays the crossover rule over an existing analysis.
//!
//! `run_pipeline()` chains both; the sweep and the CLI `backtest` command use it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use ratelab_core::advisory::{Advisor, AdvisoryContext, AdvisorySignal, MockAdvisor, RuleAdvisor};
use ratelab_core::signals::MacdRsiRule;
use ratelab_core::{calculate_indicators, run_backtest_detailed, BacktestError, BacktestRun};
use ratelab_core::{IndicatorSample, RawSample};

use crate::config::{AdvisorKind, ConfigError, Timeframe, TradingSettings};
use crate::feed::{FeedError, MarketFeed};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Feed(#[from] FeedError),

    #[error(
        "Not enough data for analysis. Please select a wider date range or a shorter indicator period."
    )]
    InsufficientData { available: usize, required: usize },

    #[error("Not enough historical data to run a backtest.")]
    InsufficientBacktestData { available: usize },
}

impl From<BacktestError> for PipelineError {
    fn from(err: BacktestError) -> Self {
        match err {
            BacktestError::InsufficientData { len } => {
                PipelineError::InsufficientBacktestData { available: len }
            }
        }
    }
}

/// Build the advisor a run config asks for.
pub fn advisor_for(kind: AdvisorKind) -> Box<dyn Advisor> {
    match kind {
        AdvisorKind::Rule => Box::new(RuleAdvisor::default()),
        AdvisorKind::Mock => Box::new(MockAdvisor),
    }
}

/// The enriched series for one symbol plus the advisor's verdict.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub settings: TradingSettings,
    pub fingerprint: String,
    pub feed: String,
    /// Raw samples fetched before enrichment.
    pub raw_len: usize,
    pub samples: Vec<IndicatorSample>,
    /// `None` when the advisor failed; the failure is logged, not fatal.
    pub advisory: Option<AdvisorySignal>,
}

impl Analysis {
    pub fn latest(&self) -> Option<&IndicatorSample> {
        self.samples.last()
    }
}

/// Fetch and enrich a series, enforcing the minimum-data preconditions.
///
/// The raw series must be longer than the RSI period, and at least one
/// sample must survive the MACD warm-up trim.
pub fn prepare(
    settings: &TradingSettings,
    feed: &dyn MarketFeed,
) -> Result<(Vec<RawSample>, Vec<IndicatorSample>), PipelineError> {
    settings.validate()?;
    let period = settings.rsi_period()?;

    let raw = feed.fetch(settings)?;
    debug!(
        symbol = %settings.symbol,
        feed = feed.name(),
        raw = raw.len(),
        "fetched series"
    );

    if raw.len() <= period.get() {
        return Err(PipelineError::InsufficientData {
            available: raw.len(),
            required: period.get() + 1,
        });
    }

    let samples = calculate_indicators(&raw, period);
    if samples.is_empty() {
        return Err(PipelineError::InsufficientData {
            available: raw.len(),
            required: ratelab_core::indicators::WARMUP_TRIM + 1,
        });
    }
    Ok((raw, samples))
}

pub fn analyze(
    settings: &TradingSettings,
    feed: &dyn MarketFeed,
    advisor: &dyn Advisor,
) -> Result<Analysis, PipelineError> {
    let (raw, samples) = prepare(settings, feed)?;

    let ctx = AdvisoryContext::new(&settings.symbol, settings.timeframe.as_str(), &samples);
    let advisory = match advisor.advise(&ctx) {
        Ok(signal) => Some(signal),
        Err(err) => {
            warn!(advisor = advisor.name(), error = %err, "advisory signal unavailable");
            None
        }
    };

    let analysis = Analysis {
        settings: settings.clone(),
        fingerprint: settings.fingerprint_with_source(&feed.source_id()),
        feed: feed.name().to_string(),
        raw_len: raw.len(),
        samples,
        advisory,
    };
    info!(
        symbol = %settings.symbol,
        timeframe = %settings.timeframe,
        samples = analysis.samples.len(),
        action = %analysis.advisory.as_ref().map_or("n/a", |a| a.action.as_str()),
        "analysis complete"
    );
    Ok(analysis)
}

/// Everything a backtest produced, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start_date: String,
    pub end_date: String,
    pub ma_period: usize,
    pub fingerprint: String,
    pub feed: String,
    pub sample_count: usize,
    pub run: BacktestRun,
    #[serde(default)]
    pub advisory: Option<AdvisorySignal>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

pub fn backtest(analysis: &Analysis) -> Result<BacktestReport, PipelineError> {
    let run = run_backtest_detailed(&analysis.samples, &MacdRsiRule::default())?;
    let settings = &analysis.settings;
    info!(
        symbol = %settings.symbol,
        trades = run.summary.total_trades,
        profit_pct = run.summary.profit_percentage,
        "backtest complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        symbol: settings.symbol.clone(),
        timeframe: settings.timeframe,
        start_date: settings.start_date.to_string(),
        end_date: settings.end_date.to_string(),
        ma_period: settings.ma_period,
        fingerprint: analysis.fingerprint.clone(),
        feed: analysis.feed.clone(),
        sample_count: analysis.samples.len(),
        run,
        advisory: analysis.advisory.clone(),
    })
}

/// Analyze then backtest in one call.
pub fn run_pipeline(
    settings: &TradingSettings,
    feed: &dyn MarketFeed,
    advisor: &dyn Advisor,
) -> Result<BacktestReport, PipelineError> {
    let analysis = analyze(settings, feed, advisor)?;
    backtest(&analysis)
}
