//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: the full `BacktestReport` with schema versioning
//! - **CSV**: the enriched series, the closed-trade tape, and the equity curve
//! - **Markdown**: a human-readable single-run report and a sweep table
//!
//! Persisted reports carry a `schema_version`. Versions newer than this
//! build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use ratelab_core::engine::ClosedTrade;
use ratelab_core::IndicatorSample;

use crate::pipeline::{BacktestReport, SCHEMA_VERSION};
use crate::sweep::SweepEntry;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport`, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

pub fn export_sweep_json(entries: &[SweepEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).context("failed to serialize sweep results to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

/// Export the enriched series. Undefined indicator values are empty cells.
///
/// Columns: time, rate, rsi, macd, signal_line, histogram
pub fn export_samples_csv(samples: &[IndicatorSample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "rate", "rsi", "macd", "signal_line", "histogram"])?;
    for s in samples {
        wtr.write_record([
            s.time.to_string(),
            format!("{:.4}", s.rate),
            opt_cell(s.rsi),
            opt_cell(s.macd),
            opt_cell(s.signal_line),
            opt_cell(s.histogram()),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export closed trades.
///
/// Columns: entry_index, entry_time, entry_price, exit_index, exit_time,
/// exit_price, units, pnl, return_pct, is_win
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "units",
        "pnl",
        "return_pct",
        "is_win",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry_index.to_string(),
            t.entry_time.to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_index.to_string(),
            t.exit_time.to_string(),
            format!("{:.4}", t.exit_price),
            format!("{:.6}", t.units),
            format!("{:.2}", t.pnl),
            format!("{:.2}", t.return_pct() * 100.0),
            t.is_win.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["step", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{eq:.2}")])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a report: `{symbol}_{timeframe}_{fingerprint prefix}`.
///
/// Identical settings from the same feed land in the same directory, so
/// re-running overwrites. The symbol is reduced to `[A-Za-z0-9_-]`.
pub fn artifact_dirname(report: &BacktestReport) -> String {
    let short = report.fingerprint.get(..12).unwrap_or(&report.fingerprint);
    format!("{}_{}_{}", path_safe(&report.symbol), report.timeframe, short)
}

fn path_safe(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Save the full artifact set for one run and return the directory.
///
/// Writes `report.json`, `indicators.csv`, `trades.csv`, `equity.csv` and
/// `report.md`.
pub fn save_artifacts(
    report: &BacktestReport,
    samples: &[IndicatorSample],
    output_dir: &Path,
) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dirname(report));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("report.json", export_json(report)?),
        ("indicators.csv", export_samples_csv(samples)?),
        ("trades.csv", export_trades_csv(&report.run.trades)?),
        ("equity.csv", export_equity_csv(&report.run.equity_curve)?),
        ("report.md", generate_report(report)),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(run_dir)
}

/// Load a report from an artifact directory's `report.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::with_capacity(1024);
    let s = &report.run.summary;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!("| Timeframe | {} |\n", report.timeframe));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        report.start_date, report.end_date
    ));
    md.push_str(&format!("| RSI Period | {} |\n", report.ma_period));
    md.push_str(&format!("| Samples | {} |\n", report.sample_count));
    md.push_str(&format!("| Feed | {} |\n", report.feed));
    md.push_str(&format!("| Fingerprint | {} |\n", report.fingerprint));
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Balance | ${:.2} |\n", s.initial_balance));
    md.push_str(&format!("| Final Balance | ${:.2} |\n", s.final_balance));
    md.push_str(&format!(
        "| Profit | ${:.2} ({:.2}%) |\n",
        s.profit, s.profit_percentage
    ));
    md.push_str(&format!("| Trades | {} |\n", s.total_trades));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!(
        "| Max Drawdown | {:.2}% |\n",
        report.run.max_drawdown() * 100.0
    ));
    if let Some(open) = &report.run.open_position {
        md.push_str(&format!(
            "| Open Position | {:.6} units @ {:.4} |\n",
            open.units, open.entry_price
        ));
    }
    md.push('\n');

    if let Some(advisory) = &report.advisory {
        md.push_str("## Advisory Signal\n\n");
        md.push_str(&format!("**{}**: {}\n", advisory.action, advisory.rationale));
    }

    md
}

/// Markdown table of a ranked sweep.
pub fn generate_sweep_table(entries: &[SweepEntry]) -> String {
    let mut md = String::from("| Rank | Symbol | Profit % | Trades | Win Rate |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");
    for (i, e) in entries.iter().enumerate() {
        match (&e.result, &e.error) {
            (Some(r), _) => md.push_str(&format!(
                "| {} | {} | {:.2}% | {} | {:.1}% |\n",
                i + 1,
                e.symbol,
                r.profit_percentage,
                r.total_trades,
                r.win_rate
            )),
            (None, err) => md.push_str(&format!(
                "| - | {} | failed: {} | | |\n",
                e.symbol,
                err.as_deref().unwrap_or("unknown error")
            )),
        }
    }
    md
}
