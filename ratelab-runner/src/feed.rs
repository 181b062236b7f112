//! Market data sources for the runner.
//!
//! Two feeds implement [`MarketFeed`]:
//! - [`SyntheticFeed`]: a seeded, mean-bounded random walk with a slow
//!   sinusoidal trend, one sample per timeframe step
//! - [`CsvFeed`]: `time,rate` rows read from disk and clipped to the range
//!
//! Synthetic data is reproducible: the per-symbol seed is derived from the
//! master seed with BLAKE3, so the same settings always produce the same
//! series regardless of which thread or sweep order fetches it.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use ratelab_core::domain::first_unordered;
use ratelab_core::RawSample;

use crate::config::{Timeframe, TradingSettings};

/// Master seed used when neither the feed nor the settings provide one.
pub const DEFAULT_MASTER_SEED: u64 = 42;

/// Bounds the synthetic walk is clamped into.
pub const SYNTHETIC_FLOOR: f64 = 5.0;
pub const SYNTHETIC_CEILING: f64 = 25.0;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("empty range: start {start} is not before end {end}")]
    EmptyRange { start: i64, end: i64 },

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("timestamps go backwards at row {index}")]
    Unordered { index: usize },
}

/// A source of raw rate samples for one symbol over one date range.
pub trait MarketFeed: Send + Sync {
    fn fetch(&self, settings: &TradingSettings) -> Result<Vec<RawSample>, FeedError>;

    fn name(&self) -> &str;

    /// Identifies where the data comes from, for run fingerprints. Two feeds
    /// with the same id return the same series for the same settings.
    fn source_id(&self) -> String {
        self.name().to_string()
    }
}

// ── Synthetic ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SyntheticFeed {
    master_seed: u64,
}

impl SyntheticFeed {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Seed for one `(symbol, timeframe)` series.
    ///
    /// A seed on the settings overrides the feed's master seed.
    pub fn sub_seed(&self, settings: &TradingSettings) -> u64 {
        let master = settings.seed.unwrap_or(self.master_seed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&master.to_le_bytes());
        hasher.update(settings.symbol.as_bytes());
        hasher.update(settings.timeframe.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_SEED)
    }
}

impl MarketFeed for SyntheticFeed {
    fn fetch(&self, settings: &TradingSettings) -> Result<Vec<RawSample>, FeedError> {
        let start = settings.start_ms();
        let end = settings.end_ms();
        if start >= end {
            return Err(FeedError::EmptyRange { start, end });
        }

        let mut rng = StdRng::seed_from_u64(self.sub_seed(settings));
        let samples = synthetic_walk(&mut rng, start, end, settings.timeframe);
        debug!(
            symbol = %settings.symbol,
            timeframe = %settings.timeframe,
            samples = samples.len(),
            "generated synthetic series"
        );
        Ok(samples)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Random walk from `start` to `end` inclusive, one sample per step.
fn synthetic_walk(rng: &mut StdRng, start: i64, end: i64, timeframe: Timeframe) -> Vec<RawSample> {
    let step = timeframe.step_ms();
    let points = (end - start) / step;
    let trend_scale = 20.0 * timeframe.hours();

    let mut rate = 10.0 + rng.gen::<f64>() * 5.0;
    let mut samples = Vec::with_capacity(points as usize + 1);
    for i in 0..=points {
        let volatility = (rng.gen::<f64>() - 0.5) * 0.5;
        let trend = (i as f64 / trend_scale).sin() * 0.2;
        rate = (rate + volatility + trend).clamp(SYNTHETIC_FLOOR, SYNTHETIC_CEILING);
        samples.push(RawSample::new(start + i * step, round4(rate)));
    }
    samples
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ── CSV ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: i64,
    rate: f64,
}

/// Reads a `time,rate` CSV (milliseconds since epoch) for the symbol in
/// the settings. The symbol itself is not checked; one file is one series.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarketFeed for CsvFeed {
    fn fetch(&self, settings: &TradingSettings) -> Result<Vec<RawSample>, FeedError> {
        let file = std::fs::File::open(&self.path).map_err(|source| FeedError::Io {
            path: self.path.clone(),
            source,
        })?;
        let samples = read_samples(file)?;

        let start = settings.start_ms();
        let end = settings.end_ms();
        let in_range: Vec<RawSample> = samples
            .into_iter()
            .filter(|s| (start..=end).contains(&s.time))
            .collect();
        debug!(
            path = %self.path.display(),
            samples = in_range.len(),
            "loaded CSV series"
        );
        Ok(in_range)
    }

    fn name(&self) -> &str {
        "csv"
    }

    fn source_id(&self) -> String {
        format!("csv:{}", self.path().display())
    }
}

/// Parse `time,rate` rows and reject decreasing timestamps.
pub fn read_samples<R: std::io::Read>(reader: R) -> Result<Vec<RawSample>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for row in rdr.deserialize() {
        let row: CsvRow = row?;
        samples.push(RawSample::new(row.time, row.rate));
    }
    if let Some(index) = first_unordered(&samples) {
        return Err(FeedError::Unordered { index });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings(symbol: &str, timeframe: Timeframe, days: i64) -> TradingSettings {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TradingSettings {
            symbol: symbol.into(),
            timeframe,
            ma_period: 14,
            start_date: start,
            end_date: start + chrono::Duration::days(days),
            seed: None,
        }
    }

    #[test]
    fn synthetic_is_deterministic() {
        let feed = SyntheticFeed::default();
        let s = settings("BTC", Timeframe::H1, 5);
        assert_eq!(feed.fetch(&s).unwrap(), feed.fetch(&s).unwrap());
    }

    #[test]
    fn symbols_get_different_series() {
        let feed = SyntheticFeed::default();
        let btc = feed.fetch(&settings("BTC", Timeframe::H1, 5)).unwrap();
        let eth = feed.fetch(&settings("ETH", Timeframe::H1, 5)).unwrap();
        assert_eq!(btc.len(), eth.len());
        assert_ne!(btc, eth);
    }

    #[test]
    fn settings_seed_overrides_master() {
        let mut s = settings("BTC", Timeframe::H1, 2);
        let a = SyntheticFeed::new(1).fetch(&s).unwrap();
        s.seed = Some(1);
        let b = SyntheticFeed::new(999).fetch(&s).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sample_counts_follow_timeframe() {
        let feed = SyntheticFeed::default();
        // One calendar day, 00:00 through 23:59.
        assert_eq!(feed.fetch(&settings("BTC", Timeframe::H1, 0)).unwrap().len(), 24);
        assert_eq!(feed.fetch(&settings("BTC", Timeframe::M15, 0)).unwrap().len(), 96);
        assert_eq!(feed.fetch(&settings("BTC", Timeframe::H4, 0)).unwrap().len(), 6);
        // Ten days of dailies: the 23:59 tail never reaches another step.
        assert_eq!(feed.fetch(&settings("BTC", Timeframe::D1, 9)).unwrap().len(), 10);
    }

    #[test]
    fn synthetic_samples_are_bounded_rounded_and_spaced() {
        let s = settings("DOGE", Timeframe::M15, 30);
        let samples = SyntheticFeed::default().fetch(&s).unwrap();
        assert_eq!(samples[0].time, s.start_ms());
        for pair in samples.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Timeframe::M15.step_ms());
        }
        for sample in &samples {
            assert!((SYNTHETIC_FLOOR..=SYNTHETIC_CEILING).contains(&sample.rate));
            assert_eq!(sample.rate, round4(sample.rate));
        }
    }

    #[test]
    fn inverted_range_is_empty() {
        let mut s = settings("BTC", Timeframe::H1, 0);
        s.end_date = s.start_date - chrono::Duration::days(1);
        let err = SyntheticFeed::default().fetch(&s).unwrap_err();
        assert!(matches!(
            err,
            FeedError::EmptyRange { start, end } if start == s.start_ms() && end == s.end_ms()
        ));
    }

    #[test]
    fn source_ids_distinguish_feeds() {
        assert_eq!(SyntheticFeed::default().source_id(), "synthetic");
        let a = CsvFeed::new("/data/a.csv").source_id();
        assert_eq!(a, "csv:/data/a.csv");
        assert_ne!(a, CsvFeed::new("/data/b.csv").source_id());
    }

    #[test]
    fn csv_rows_parse() {
        let data = "time,rate\n1000,10.5\n2000, 11.25\n2000,11.0\n";
        let samples = read_samples(data.as_bytes()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1], RawSample::new(2000, 11.25));
    }

    #[test]
    fn csv_rejects_backwards_time() {
        let data = "time,rate\n1000,10.5\n3000,11.0\n2000,12.0\n";
        let err = read_samples(data.as_bytes()).unwrap_err();
        assert!(matches!(err, FeedError::Unordered { index: 2 }));
    }

    #[test]
    fn csv_rejects_garbage() {
        let data = "time,rate\nyesterday,10.5\n";
        assert!(matches!(read_samples(data.as_bytes()), Err(FeedError::Csv(_))));
    }

    #[test]
    fn missing_csv_is_io_error() {
        let feed = CsvFeed::new("/nonexistent/ratelab/series.csv");
        let err = feed.fetch(&settings("BTC", Timeframe::H1, 1)).unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
    }
}
