//! Scan orchestration.
//!
//! For each instrument, implied volatility and price history are fetched
//! concurrently, realised volatility is computed and the two are reconciled.
//! Each instrument runs in its own tokio task. A failure, even a panic, in one
//! instrument leaves a row of missing readings in the report and never aborts
//! the scan.

use crate::config::{ProviderKind, ScannerConfig};
use crate::error::ScanError;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use vrp_core::realized::{compute_rv, rolling_rv, DEFAULT_RV_WINDOW};
use vrp_core::reconcile::reconcile_series;
use vrp_core::types::{
    Instrument, MissingReason, VolatilityReading, VolatilitySeries, VrpPoint, VrpResult,
};
use vrp_feeds::prelude::*;
use vrp_store::prelude::*;

/// Stored implied volatility per symbol, used to build VRP over time.
pub type ImpliedHistory = HashMap<String, VolatilitySeries>;

/// Per-scan settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Scan date
    pub as_of: NaiveDate,
    /// Realised volatility window
    pub rv_window: usize,
    /// Run instruments concurrently
    pub parallel: bool,
    /// Attach VRP over time to the report
    pub include_series: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            as_of: Utc::now().date_naive(),
            rv_window: DEFAULT_RV_WINDOW,
            parallel: true,
            include_series: false,
        }
    }
}

/// Price history and implied volatility sources.
#[derive(Clone)]
pub struct Sources {
    /// Price history source
    pub history: PriceHistorySource,
    /// Implied volatility source
    pub implied: ImpliedVolSource,
}

impl Sources {
    /// Sources over one provider answering all three capabilities.
    pub fn from_provider<P>(provider: Arc<P>, retry: RetryPolicy, as_of: NaiveDate) -> Self
    where
        P: QuoteProvider + OptionChainProvider + MacroSeriesProvider + 'static,
    {
        let history = PriceHistorySource::new(provider.clone());
        let implied = ImpliedVolSource::new(history.clone(), provider.clone(), provider)
            .with_retry(retry)
            .with_as_of(as_of);
        Self { history, implied }
    }

    /// Sources for the configured provider.
    pub fn from_config(config: &ScannerConfig, as_of: NaiveDate) -> Self {
        let retry = config.retry.policy();
        match config.provider {
            ProviderKind::Synthetic => Self::from_provider(
                Arc::new(SyntheticProvider::with_defaults(config.seed, as_of)),
                retry,
                as_of,
            ),
            ProviderKind::Csv => Self::from_provider(
                Arc::new(CsvDirectoryProvider::new(&config.data_dir)),
                retry,
                as_of,
            ),
        }
    }
}

struct Evaluation {
    result: VrpResult,
    series: Option<Vec<VrpPoint>>,
}

/// Scan orchestrator
pub struct Scanner {
    sources: Arc<Sources>,
    settings: ScanSettings,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(sources: Sources, settings: ScanSettings) -> Self {
        Self {
            sources: Arc::new(sources),
            settings,
        }
    }

    /// Scan settings
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scan `watchlist`. Results follow watchlist order.
    pub async fn scan(&self, watchlist: &[Instrument]) -> ScanReport {
        self.scan_with_history(watchlist, &ImpliedHistory::new()).await
    }

    /// Scan `watchlist`, seeding VRP over time with stored implied readings.
    pub async fn scan_with_history(
        &self,
        watchlist: &[Instrument],
        implied_history: &ImpliedHistory,
    ) -> ScanReport {
        let start = Instant::now();
        let settings = self.settings;
        info!(
            instruments = watchlist.len(),
            as_of = %settings.as_of,
            window = settings.rv_window,
            parallel = settings.parallel,
            "Scan starting"
        );

        let mut report = ScanReport::new(settings.as_of);
        let mut handles = Vec::with_capacity(watchlist.len());
        for instrument in watchlist {
            let sources = Arc::clone(&self.sources);
            let task_instrument = instrument.clone();
            let prior = implied_history.get(&instrument.symbol).cloned();
            let handle = tokio::spawn(async move {
                evaluate(&sources, &settings, &task_instrument, prior).await
            });

            if settings.parallel {
                handles.push((instrument, handle));
            } else {
                let outcome = join_outcome(instrument, handle.await);
                record(&mut report, instrument, outcome, settings.as_of);
            }
        }

        for (instrument, handle) in handles {
            let outcome = join_outcome(instrument, handle.await);
            record(&mut report, instrument, outcome, settings.as_of);
        }

        info!(
            complete = report.complete_count(),
            missing = report.missing_count(),
            errors = report.errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Scan finished"
        );
        report
    }
}

fn join_outcome(
    instrument: &Instrument,
    joined: Result<Result<Evaluation, ScanError>, tokio::task::JoinError>,
) -> Result<Evaluation, ScanError> {
    joined.unwrap_or_else(|err| Err(ScanError::task(&instrument.symbol, err.to_string())))
}

fn record(
    report: &mut ScanReport,
    instrument: &Instrument,
    outcome: Result<Evaluation, ScanError>,
    as_of: NaiveDate,
) {
    match outcome {
        Ok(evaluation) => {
            if let Some(series) = evaluation.series {
                report
                    .vrp_series
                    .insert(instrument.symbol.clone(), series);
            }
            report.results.push(evaluation.result);
        }
        Err(err) => {
            warn!(symbol = %instrument.symbol, error = %err, "Instrument aborted");
            report.results.push(VrpResult::unavailable(
                instrument,
                as_of,
                err.missing_reason(),
            ));
            report.errors.push(ScanIssue {
                symbol: instrument.symbol.clone(),
                message: err.to_string(),
            });
        }
    }
}

async fn evaluate(
    sources: &Sources,
    settings: &ScanSettings,
    instrument: &Instrument,
    prior_implied: Option<VolatilitySeries>,
) -> Result<Evaluation, ScanError> {
    let (implied, history) = tokio::join!(
        sources.implied.fetch_iv(instrument),
        sources
            .history
            .fetch_price_history(&instrument.symbol, Lookback::OneYearBuffered)
    );

    let realized = match &history {
        Some(series) => compute_rv(series, settings.rv_window, instrument.convention),
        None => VolatilityReading::missing(MissingReason::no_data(format!(
            "no price history for {}",
            instrument.symbol
        ))),
    };
    if let Some(reason) = realized.missing_reason() {
        debug!(symbol = %instrument.symbol, %reason, "No realised volatility");
    }

    let series = match (&history, settings.include_series) {
        (Some(prices), true) => {
            let rv_series = rolling_rv(prices, settings.rv_window, instrument.convention);
            let iv_series = implied_series(instrument, prior_implied, &implied, settings.as_of);
            let points = reconcile_series(&iv_series, &rv_series)
                .map_err(|e| ScanError::reconcile(&instrument.symbol, e))?;
            Some(points)
        }
        _ => None,
    };

    let result = VrpResult::build(instrument, settings.as_of, implied, realized)
        .map_err(|e| ScanError::reconcile(&instrument.symbol, e))?;
    debug!(
        symbol = %result.symbol,
        implied = %result.implied,
        realized = %result.realized,
        vrp = %result.vrp,
        "Instrument scanned"
    );

    Ok(Evaluation { result, series })
}

/// Stored implied readings followed by today's, strictly increasing by date.
///
/// Points are dated by scan date, the same key the history store uses, so
/// today's reading replaces any row stored for the same scan date. Stored
/// rows dated after `as_of` are dropped.
fn implied_series(
    instrument: &Instrument,
    prior: Option<VolatilitySeries>,
    current: &VolatilityReading,
    as_of: NaiveDate,
) -> VolatilitySeries {
    let mut series = prior.unwrap_or_else(|| VolatilitySeries::new(instrument.unit()));
    if let Some(value) = current.value() {
        series.points.retain(|(d, _)| *d < as_of);
        series.push(as_of, value);
    }
    series
}

/// Outcome of [`run_scan`].
#[derive(Debug)]
pub struct ScanRun {
    /// The published report
    pub report: ScanReport,
    /// History store failure, if persisting the report failed
    pub store_error: Option<ScanError>,
}

/// Run a scan, persist it and publish it.
///
/// The report reaches every sink and the caller even if the history store
/// fails; the store error travels alongside it. Sink failures are logged and
/// skipped.
pub async fn run_scan(
    scanner: &Scanner,
    watchlist: &[Instrument],
    mut store: Option<&mut HistoryStore>,
    sinks: &[Box<dyn ReportSink>],
) -> ScanRun {
    let implied_history: ImpliedHistory = match store.as_deref() {
        Some(store) if scanner.settings().include_series => watchlist
            .iter()
            .map(|i| (i.symbol.clone(), store.implied_series(&i.symbol, i.unit())))
            .collect(),
        _ => ImpliedHistory::new(),
    };

    let mut report = scanner.scan_with_history(watchlist, &implied_history).await;

    let store_error = match store.as_deref_mut() {
        Some(store) => persist(store, &mut report).err(),
        None => None,
    };
    if let Some(err) = &store_error {
        warn!(error = %err, "History not persisted");
    }

    for sink in sinks {
        if let Err(err) = sink.publish(&report) {
            warn!(sink = sink.name(), error = %err, "Report sink failed");
        }
    }

    ScanRun {
        report,
        store_error,
    }
}

fn persist(store: &mut HistoryStore, report: &mut ScanReport) -> Result<(), ScanError> {
    store.append(&report.results, report.as_of)?;
    store.flush()?;
    for result in &report.results {
        if let Some(vrp) = result.vrp.value() {
            if let Some(rank) = store.percentile_rank(&result.symbol, vrp) {
                report.percentile_ranks.insert(result.symbol.clone(), rank);
            }
        }
    }
    Ok(())
}
