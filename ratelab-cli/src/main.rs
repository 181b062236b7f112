//! RateLab CLI: analyze, backtest, and sweep commands.
//!
//! Commands:
//! - `analyze`: fetch a series, compute indicators, print the advisory signal
//! - `backtest`: analyze, then replay the MACD/RSI crossover rule
//! - `sweep`: backtest the same settings across many symbols in parallel
//!
//! Settings come from an optional TOML file (`--config`); flags override it.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratelab_core::IndicatorSample;
use ratelab_runner::config::SettingsOverrides;
use ratelab_runner::export::{export_sweep_json, generate_sweep_table, save_artifacts};
use ratelab_runner::{
    advisor_for, analyze, backtest, Analysis, BacktestReport, CsvFeed, LogFormat, LoggingConfig,
    MarketFeed, RunConfig, SweepEntry, SymbolSweep, SyntheticFeed, Timeframe,
};

#[derive(Parser)]
#[command(
    name = "ratelab",
    about = "RateLab CLI: MACD/RSI analysis and backtesting for rate series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators and print the latest values and advisory signal.
    Analyze {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Analyze, then backtest the crossover rule over the enriched series.
    Backtest {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Backtest the same settings across several symbols.
    Sweep {
        #[command(flatten)]
        run: RunArgs,

        /// Symbols to sweep (comma-separated). Defaults to the config's sweep list.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol, e.g. BTC, ETH, SOL, DOGE.
    #[arg(long)]
    symbol: Option<String>,

    /// Timeframe: m15, h1, h4 or d1.
    #[arg(long)]
    timeframe: Option<String>,

    /// RSI period.
    #[arg(long)]
    period: Option<usize>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Seed for the synthetic feed.
    #[arg(long)]
    seed: Option<u64>,

    /// Read `time,rate` rows from this CSV instead of the synthetic feed.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write report and CSV artifacts under this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Load the config file (or defaults) and apply flag overrides.
    /// Validation runs once, on the layered result.
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::read_file(path)?,
            None => RunConfig::default(),
        };
        self.overrides().apply(&mut config.settings)?;
        config.settings.validate().context("invalid settings")?;
        Ok(config)
    }

    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            ma_period: self.period,
            start_date: self.start.clone(),
            end_date: self.end.clone(),
            seed: self.seed,
        }
    }

    fn feed(&self) -> Box<dyn MarketFeed> {
        match &self.input {
            Some(path) => Box::new(CsvFeed::new(path)),
            None => Box::new(SyntheticFeed::default()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { run } => run_analyze(&run),
        Commands::Backtest { run } => run_backtest_cmd(&run),
        Commands::Sweep { run, symbols } => run_sweep(&run, symbols),
    }
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    match config.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn run_analyze(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    init_tracing(&config.logging);

    let feed = args.feed();
    let advisor = advisor_for(config.advisor);
    let analysis = analyze(&config.settings, feed.as_ref(), advisor.as_ref())?;

    print_analysis(&analysis);
    Ok(())
}

fn run_backtest_cmd(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    init_tracing(&config.logging);

    let feed = args.feed();
    let advisor = advisor_for(config.advisor);
    let analysis = analyze(&config.settings, feed.as_ref(), advisor.as_ref())?;
    let report = backtest(&analysis)?;

    print_analysis(&analysis);
    print_backtest(&report);

    if let Some(dir) = &args.output_dir {
        let run_dir = save_artifacts(&report, &analysis.samples, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep(args: &RunArgs, symbols: Vec<String>) -> Result<()> {
    let config = args.resolve()?;
    init_tracing(&config.logging);

    let symbols = config.sweep_symbols(&symbols);
    if symbols.is_empty() {
        bail!("no symbols to sweep");
    }
    if args.input.is_some() && symbols.len() > 1 {
        bail!("--input reads a single series; sweep one symbol or use the synthetic feed");
    }

    let feed = args.feed();
    let advisor = advisor_for(config.advisor);
    info!(symbols = symbols.len(), "starting sweep");
    let entries = SymbolSweep::new(feed.as_ref(), advisor.as_ref()).run(&config.settings, &symbols);

    print_sweep(&config.settings.timeframe, &entries);

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
        let path = dir.join(format!("sweep_{}.json", config.settings.timeframe));
        std::fs::write(&path, export_sweep_json(&entries)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Sweep saved to: {}", path.display());
    }

    if entries.iter().all(|e| !e.is_ok()) {
        bail!("every symbol in the sweep failed");
    }
    Ok(())
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.precision$}"))
}

fn print_analysis(analysis: &Analysis) {
    let s = &analysis.settings;
    println!();
    println!("=== Analysis ===");
    println!("Symbol:         {} ({})", s.symbol, s.timeframe);
    println!("Period:         {} to {}", s.start_date, s.end_date);
    println!(
        "Samples:        {} ({} raw)",
        analysis.samples.len(),
        analysis.raw_len
    );
    if let Some(latest) = analysis.latest() {
        print_latest(latest);
    }
    match &analysis.advisory {
        Some(signal) => {
            println!();
            println!("Signal:         {}", signal.action);
            println!("Rationale:      {}", signal.rationale);
        }
        None => println!("Signal:         unavailable"),
    }
}

fn print_latest(latest: &IndicatorSample) {
    println!("Rate:           {:.4}", latest.rate);
    println!("RSI:            {}", fmt_opt(latest.rsi, 2));
    println!("MACD:           {}", fmt_opt(latest.macd, 4));
    println!("Signal Line:    {}", fmt_opt(latest.signal_line, 4));
}

fn print_backtest(report: &BacktestReport) {
    let r = &report.run.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Initial:        ${:.2}", r.initial_balance);
    println!("Final:          ${:.2}", r.final_balance);
    println!("Profit:         ${:.2} ({:.2}%)", r.profit, r.profit_percentage);
    println!("Trades:         {}", r.total_trades);
    println!("Winning:        {}", r.winning_trades);
    println!("Win Rate:       {:.1}%", r.win_rate);
    println!(
        "Max Drawdown:   {:.2}%",
        report.run.max_drawdown() * 100.0
    );
    if report.run.open_position.is_some() {
        println!("Position still open at the final rate (valued, not counted as a trade)");
    }
}

fn print_sweep(timeframe: &Timeframe, entries: &[SweepEntry]) {
    println!();
    println!("=== Sweep ({timeframe}) ===");
    print!("{}", generate_sweep_table(entries));
}
