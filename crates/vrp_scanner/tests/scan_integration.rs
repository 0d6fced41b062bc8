//! Scan orchestration end to end over synthetic, CSV and faulty providers.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use vrp_core::types::{Instrument, IvSource, MissingReason, VolUnit, VolatilityConvention};
use vrp_feeds::prelude::*;
use vrp_feeds::providers::MeanReversionModel;
use vrp_scanner::prelude::*;
use vrp_store::prelude::*;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

fn settings() -> ScanSettings {
    ScanSettings {
        as_of: as_of(),
        rv_window: 21,
        parallel: true,
        include_series: false,
    }
}

/// Synthetic data with injectable failures.
#[derive(Default)]
struct FaultyProvider {
    inner: Option<SyntheticProvider>,
    no_expirations: bool,
    rate_limit_chains: bool,
    panic_on: Option<&'static str>,
    chain_calls: AtomicU32,
}

impl FaultyProvider {
    fn new() -> Self {
        Self {
            inner: Some(SyntheticProvider::with_defaults(42, as_of())),
            ..Default::default()
        }
    }

    fn inner(&self) -> Result<&SyntheticProvider, ProviderError> {
        self.inner
            .as_ref()
            .ok_or_else(|| ProviderError::transport("offline"))
    }
}

#[async_trait::async_trait]
impl QuoteProvider for FaultyProvider {
    async fn get_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Result<Vec<HistoryRow>, ProviderError> {
        if self.panic_on == Some(symbol) {
            panic!("corrupt payload for {}", symbol);
        }
        self.inner()?.get_history(symbol, lookback).await
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        self.inner()?.get_current_price(symbol).await
    }
}

#[async_trait::async_trait]
impl OptionChainProvider for FaultyProvider {
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, ProviderError> {
        self.chain_calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limit_chains {
            return Err(ProviderError::rate_limited("options"));
        }
        if self.no_expirations {
            return Ok(Vec::new());
        }
        self.inner()?.list_expirations(symbol).await
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChain, ProviderError> {
        self.inner()?.get_chain(symbol, expiration).await
    }
}

#[async_trait::async_trait]
impl MacroSeriesProvider for FaultyProvider {
    async fn get_observations(
        &self,
        series_id: &str,
    ) -> Result<Vec<RawObservation>, ProviderError> {
        self.inner()?.get_observations(series_id).await
    }
}

fn scanner(provider: Arc<FaultyProvider>, settings: ScanSettings) -> Scanner {
    Scanner::new(
        Sources::from_provider(provider, RetryPolicy::immediate(5), as_of()),
        settings,
    )
}

#[tokio::test]
async fn test_default_watchlist_completes() {
    let watchlist = Instrument::default_watchlist();
    let report = scanner(Arc::new(FaultyProvider::new()), settings())
        .scan(&watchlist)
        .await;

    let symbols: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SPY", "GLD", "^TNX"]);
    assert_eq!(report.complete_count(), 3);
    assert!(report.errors.is_empty());

    let tnx = report.result("^TNX").unwrap();
    assert_eq!(tnx.unit, VolUnit::BasisPoints);
    assert_eq!(tnx.vrp.unit(), Some(VolUnit::BasisPoints));
    let expected = tnx.implied.value().unwrap() - tnx.realized.value().unwrap();
    assert!((tnx.vrp.value().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_sequential_matches_parallel() {
    let watchlist = Instrument::default_watchlist();
    let parallel = scanner(Arc::new(FaultyProvider::new()), settings())
        .scan(&watchlist)
        .await;
    let sequential = scanner(
        Arc::new(FaultyProvider::new()),
        ScanSettings {
            parallel: false,
            ..settings()
        },
    )
    .scan(&watchlist)
    .await;
    assert_eq!(parallel.results, sequential.results);
}

#[tokio::test]
async fn test_zero_expirations_only_affects_chain_instrument() {
    let provider = Arc::new(FaultyProvider {
        no_expirations: true,
        ..FaultyProvider::new()
    });
    let report = scanner(provider, settings())
        .scan(&Instrument::default_watchlist())
        .await;

    let gld = report.result("GLD").unwrap();
    assert!(gld.implied.is_missing());
    assert!(gld.vrp.is_missing());
    assert!(!gld.realized.is_missing());
    assert!(report.result("SPY").unwrap().is_complete());
    assert!(report.result("^TNX").unwrap().is_complete());
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_persistent_rate_limit_degrades_to_missing() {
    let provider = Arc::new(FaultyProvider {
        rate_limit_chains: true,
        ..FaultyProvider::new()
    });
    let report = scanner(provider.clone(), settings())
        .scan(&Instrument::default_watchlist())
        .await;

    let gld = report.result("GLD").unwrap();
    assert_eq!(
        gld.implied.missing_reason(),
        Some(&MissingReason::RateLimited { attempts: 5 })
    );
    assert_eq!(provider.chain_calls.load(Ordering::SeqCst), 5);
    assert_eq!(report.complete_count(), 2);
}

#[tokio::test]
async fn test_panicking_instrument_is_isolated() {
    let provider = Arc::new(FaultyProvider {
        panic_on: Some("GLD"),
        ..FaultyProvider::new()
    });
    let report = scanner(provider, settings())
        .scan(&Instrument::default_watchlist())
        .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[1].symbol, "GLD");
    assert!(report.results[1].implied.is_missing());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].symbol, "GLD");
    assert!(report.result("SPY").unwrap().is_complete());
}

#[tokio::test]
async fn test_unit_mismatch_aborts_only_that_instrument() {
    // A yield quoted with an option chain: chain IV is percent, the
    // instrument's convention is basis points.
    let synthetic = SyntheticProvider::with_defaults(42, as_of()).with_symbol(
        "TYF",
        4.3,
        Box::new(MeanReversionModel::for_yields(4.2)),
        false,
    );
    let provider = Arc::new(FaultyProvider {
        inner: Some(synthetic),
        ..Default::default()
    });
    let mut watchlist = Instrument::default_watchlist();
    watchlist.insert(
        0,
        Instrument::new(
            "TYF",
            VolatilityConvention::BasisPointsOfYield,
            IvSource::OptionChain { band: 5.0 },
        ),
    );

    let report = scanner(provider, settings()).scan(&watchlist).await;

    assert_eq!(report.results.len(), 4);
    assert!(matches!(
        report.results[0].vrp.missing_reason(),
        Some(MissingReason::UnitMismatch { .. })
    ));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.complete_count(), 3);
}

#[tokio::test]
async fn test_all_providers_offline_still_reports_every_instrument() {
    let provider = Arc::new(FaultyProvider::default());
    let report = scanner(provider, settings())
        .scan(&Instrument::default_watchlist())
        .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.missing_count(), 3);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_run_scan_persists_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("vrp_history.csv");
    let json_path = dir.path().join("report.json");
    let watchlist = Instrument::default_watchlist();
    let scanner = scanner(
        Arc::new(FaultyProvider::new()),
        ScanSettings {
            include_series: true,
            ..settings()
        },
    );
    let sinks: Vec<Box<dyn ReportSink>> = vec![
        Box::new(LogSink::new()),
        Box::new(JsonFileSink::new(&json_path)),
    ];

    let mut store = HistoryStore::open(&history_path).unwrap();
    let first = run_scan(&scanner, &watchlist, Some(&mut store), &sinks).await;
    assert!(first.store_error.is_none());
    let first = first.report;
    assert_eq!(store.rows().len(), 3);
    assert_eq!(first.percentile_ranks.get("SPY"), Some(&100.0));

    let second = run_scan(&scanner, &watchlist, Some(&mut store), &sinks)
        .await
        .report;
    assert_eq!(HistoryStore::open(&history_path).unwrap().rows().len(), 6);
    assert_eq!(second.results, first.results);

    let spy_series = second.vrp_series.get("SPY").unwrap();
    assert!(spy_series.last().unwrap().vrp.is_some());
    assert!(spy_series.first().unwrap().vrp.is_none());

    let json = std::fs::read_to_string(&json_path).unwrap();
    assert!(json.contains("\"symbol\": \"GLD\""));
}

#[tokio::test]
async fn test_run_scan_without_store() {
    let scanner = scanner(Arc::new(FaultyProvider::new()), settings());
    let run = run_scan(&scanner, &Instrument::default_watchlist(), None, &[]).await;
    assert!(run.store_error.is_none());
    assert_eq!(run.report.results.len(), 3);
    assert!(run.report.percentile_ranks.is_empty());
}

#[tokio::test]
async fn test_history_write_failure_keeps_report() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("vrp_history.csv");
    let json_path = dir.path().join("report.json");
    let mut store = HistoryStore::open(&history_path).unwrap();
    std::fs::create_dir(&history_path).unwrap();

    let scanner = scanner(Arc::new(FaultyProvider::new()), settings());
    let sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(JsonFileSink::new(&json_path))];
    let run = run_scan(
        &scanner,
        &Instrument::default_watchlist(),
        Some(&mut store),
        &sinks,
    )
    .await;

    assert!(matches!(run.store_error, Some(ScanError::Store(_))));
    assert_eq!(run.report.results.len(), 3);
    assert_eq!(run.report.complete_count(), 3);
    assert!(run.report.percentile_ranks.is_empty());
    assert!(json_path.exists());
}

fn write(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Daily closes oscillating around `level`, ending 2024-06-13.
fn price_csv(level: f64, step: f64) -> String {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut csv = String::from("date,close,adj_close\n");
    for k in 0..44 {
        let date = start + chrono::Duration::days(k);
        let close = level + if k % 2 == 0 { step } else { -step } * (1.0 + (k % 3) as f64);
        csv.push_str(&format!("{},{},\n", date, close));
    }
    csv
}

#[tokio::test]
async fn test_csv_snapshot_scan() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "prices/SPY.csv", &price_csv(520.0, 2.0));
    write(root, "prices/GLD.csv", &price_csv(215.0, 1.0));
    write(root, "prices/TNX.csv", &price_csv(4.25, 0.02));
    write(
        root,
        "prices/MOVE.csv",
        "date,close,adj_close\n2024-06-12,98.1,\n2024-06-13,99.4,\n",
    );
    write(
        root,
        "macro/VIXCLS.csv",
        "date,value\n2024-06-11,12.9\n2024-06-12,13.1\n2024-06-13,.\n",
    );
    write(
        root,
        "options/GLD.csv",
        "expiration,kind,strike,implied_volatility\n\
         2024-06-21,call,215.0,0.15\n\
         2024-06-21,put,216.0,0.17\n\
         2024-06-21,call,240.0,0.40\n\
         2024-06-28,call,215.0,0.90\n",
    );

    let sources = Sources::from_provider(
        Arc::new(CsvDirectoryProvider::new(root)),
        RetryPolicy::immediate(5),
        as_of(),
    );
    let report = Scanner::new(sources, settings())
        .scan(&Instrument::default_watchlist())
        .await;

    assert_eq!(report.complete_count(), 3);
    assert!(report.errors.is_empty());
    assert_eq!(report.result("SPY").unwrap().implied.value(), Some(13.1));
    let gld = report.result("GLD").unwrap().implied.value().unwrap();
    assert!((gld - 16.0).abs() < 1e-9);
    let tnx = report.result("^TNX").unwrap();
    assert_eq!(tnx.implied.value(), Some(99.4));
    assert_eq!(tnx.unit, VolUnit::BasisPoints);
}
