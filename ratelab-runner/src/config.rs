//! Serializable run configuration: trading settings, logging, advisor, sweep.
//!
//! Loaded from TOML. Every table and field is optional; anything left out
//! falls back to BTC, h1, period 14 and the last 30 days:
//!
//! ```toml
//! [settings]
//! symbol = "ETH"
//! timeframe = "h4"
//! start_date = "2024-01-01"
//! end_date = "2024-03-31"
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ratelab_core::indicators::DEFAULT_RSI_PERIOD;

/// Symbols the synthetic feed knows about; also the default sweep universe.
pub const SYMBOLS: [&str; 4] = ["BTC", "ETH", "SOL", "DOGE"];

pub const DEFAULT_SYMBOL: &str = "BTC";

/// Days of history in the default range.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("ma_period must be a positive integer")]
    InvalidPeriod,
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown timeframe '{0}' (expected one of m15, h1, h4, d1)")]
    UnknownTimeframe(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Sampling step of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    M15,
    #[default]
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1];

    pub fn step_ms(&self) -> i64 {
        match self {
            Timeframe::M15 => HOUR_MS / 4,
            Timeframe::H1 => HOUR_MS,
            Timeframe::H4 => 4 * HOUR_MS,
            Timeframe::D1 => 24 * HOUR_MS,
        }
    }

    /// Step length in hours (fractional for sub-hour steps).
    pub fn hours(&self) -> f64 {
        self.step_ms() as f64 / HOUR_MS as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M15 => "m15",
            Timeframe::H1 => "h1",
            Timeframe::H4 => "h4",
            Timeframe::D1 => "d1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownTimeframe(s.to_string()))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate(s.to_string()))
}

/// Canonical form of a symbol: trimmed and upper-cased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// What to analyze: one symbol, one timeframe, one date range.
///
/// Missing fields take their values from [`TradingSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// RSI smoothing period.
    pub ma_period: usize,
    /// First day of the range (inclusive, from 00:00 UTC).
    pub start_date: NaiveDate,
    /// Last day of the range (inclusive, through 23:59 UTC).
    pub end_date: NaiveDate,
    /// Master seed for synthetic data. `None` uses the feed's own seed.
    pub seed: Option<u64>,
}

impl TradingSettings {
    /// Defaults anchored on `today`: BTC, h1, period 14, last 30 days.
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            timeframe: Timeframe::default(),
            ma_period: DEFAULT_RSI_PERIOD,
            start_date: today - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end_date: today,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rsi_period()?;
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn rsi_period(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.ma_period).ok_or(ConfigError::InvalidPeriod)
    }

    /// Same settings for another symbol.
    pub fn for_symbol(&self, symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..self.clone()
        }
    }

    /// Range start, milliseconds since epoch.
    pub fn start_ms(&self) -> i64 {
        self.start_date
            .and_hms_opt(0, 0, 0)
            .map_or(0, |dt| dt.and_utc().timestamp_millis())
    }

    /// Range end (23:59 on the end date), milliseconds since epoch.
    pub fn end_ms(&self) -> i64 {
        self.end_date
            .and_hms_opt(23, 59, 0)
            .map_or(0, |dt| dt.and_utc().timestamp_millis())
    }

    /// Deterministic BLAKE3 fingerprint of these settings.
    ///
    /// Two runs with identical settings share a fingerprint and, on the
    /// synthetic feed, identical data.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.timeframe.as_str().as_bytes());
        hasher.update(&(self.ma_period as u64).to_le_bytes());
        hasher.update(self.start_date.to_string().as_bytes());
        hasher.update(self.end_date.to_string().as_bytes());
        if let Some(seed) = self.seed {
            hasher.update(&seed.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Fingerprint of these settings read from a particular data source
    /// (see `MarketFeed::source_id`).
    pub fn fingerprint_with_source(&self, source: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.fingerprint().as_bytes());
        hasher.update(source.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Command-line overrides layered on top of file settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub ma_period: Option<usize>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub seed: Option<u64>,
}

impl SettingsOverrides {
    /// Apply every set override. Does not validate the result.
    pub fn apply(&self, settings: &mut TradingSettings) -> Result<(), ConfigError> {
        if let Some(symbol) = &self.symbol {
            settings.symbol = normalize_symbol(symbol);
        }
        if let Some(tf) = &self.timeframe {
            settings.timeframe = tf.parse()?;
        }
        if let Some(period) = self.ma_period {
            settings.ma_period = period;
        }
        if let Some(start) = &self.start_date {
            settings.start_date = parse_date(start)?;
        }
        if let Some(end) = &self.end_date {
            settings.end_date = parse_date(end)?;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        Ok(())
    }
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self::default_for(Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Which advisor produces the headline BUY/SELL/HOLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorKind {
    #[default]
    Rule,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_symbols")]
    pub symbols: Vec<String>,
}

fn default_sweep_symbols() -> Vec<String> {
    SYMBOLS.iter().map(|s| s.to_string()).collect()
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            symbols: default_sweep_symbols(),
        }
    }
}

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    #[serde(default)]
    pub settings: TradingSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub advisor: AdvisorKind,
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_toml(content)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Load a config file without validating it, so overrides can still
    /// repair it. Callers validate after layering.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Parse without validating. Symbols are normalized.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: RunConfig = toml::from_str(content)?;
        config.settings.symbol = normalize_symbol(&config.settings.symbol);
        config.sweep.symbols = config.sweep.symbols.iter().map(|s| normalize_symbol(s)).collect();
        Ok(config)
    }

    /// Symbols for a sweep: `requested` if non-empty, else the configured
    /// list. Either way normalized, with duplicates removed in order.
    pub fn sweep_symbols(&self, requested: &[String]) -> Vec<String> {
        let source = if requested.is_empty() {
            self.sweep.symbols.as_slice()
        } else {
            requested
        };
        let mut symbols: Vec<String> = Vec::with_capacity(source.len());
        for symbol in source.iter().map(|s| normalize_symbol(s)) {
            if !symbol.is_empty() && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }
}
