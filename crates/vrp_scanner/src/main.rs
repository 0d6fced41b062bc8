//! VRP Scanner CLI
//!
//! Scans the configured watchlist once, appends the results to the history
//! file and prints the report.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vrp_scanner::prelude::*;
use vrp_store::prelude::{HistoryStore, JsonFileSink, LogSink, ReportSink};

/// Volatility risk premium scanner
#[derive(Parser, Debug)]
#[command(name = "vrp-scan")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Realised volatility window, in trading days
    #[arg(short, long)]
    window: Option<usize>,

    /// Market data provider (synthetic, csv)
    #[arg(short, long)]
    provider: Option<ProviderKind>,

    /// Scan date (YYYY-MM-DD), today by default
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Do not read or append the history file
    #[arg(long)]
    no_history: bool,

    /// Also write the report as JSON to this path
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Scan instruments one at a time
    #[arg(long)]
    sequential: bool,

    /// Attach VRP over time to the report
    #[arg(long)]
    series: bool,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::load_or_default()?,
    }
    .with_env_override();

    if let Some(window) = args.window {
        config.rv_window = window;
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if args.sequential {
        config.parallel = false;
    }
    if args.series {
        config.include_series = true;
    }
    config.validate()?;

    init_tracing(&config.log_level);

    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    tracing::info!(
        provider = ?config.provider,
        window = config.rv_window,
        instruments = config.watchlist.len(),
        %as_of,
        "VRP scanner configuration loaded"
    );

    let scanner = Scanner::new(
        Sources::from_config(&config, as_of),
        config.scan_settings(as_of),
    );

    let mut store = if args.no_history {
        None
    } else {
        match HistoryStore::open(&config.history_path) {
            Ok(store) => Some(store),
            Err(err) => {
                tracing::warn!(error = %err, "History unavailable, scanning without it");
                None
            }
        }
    };

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(LogSink::new())];
    if let Some(path) = args.json {
        sinks.push(Box::new(JsonFileSink::new(path)));
    }

    let ScanRun {
        report,
        store_error,
    } = run_scan(&scanner, &config.watchlist, store.as_mut(), &sinks).await;

    println!("{:<10} {:>12} {:>12} {:>12}", "Symbol", "IV", "RV", "VRP");
    for result in &report.results {
        println!(
            "{:<10} {:>12} {:>12} {:>12}",
            result.symbol,
            result.implied.to_string(),
            result.realized.to_string(),
            result.vrp.to_string()
        );
    }

    match store_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
