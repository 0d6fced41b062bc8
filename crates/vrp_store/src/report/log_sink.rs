//! Report sink writing one log line per instrument.

use super::{ReportSink, ScanReport};
use crate::error::StoreError;
use tracing::{info, warn};

/// Logs the report through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, report: &ScanReport) -> Result<(), StoreError> {
        for result in &report.results {
            match report.percentile_ranks.get(&result.symbol) {
                Some(rank) => info!(
                    symbol = %result.symbol,
                    implied = %result.implied,
                    realized = %result.realized,
                    vrp = %result.vrp,
                    percentile = rank.round(),
                    "VRP"
                ),
                None => info!(
                    symbol = %result.symbol,
                    implied = %result.implied,
                    realized = %result.realized,
                    vrp = %result.vrp,
                    "VRP"
                ),
            }
        }
        for issue in &report.errors {
            warn!(symbol = %issue.symbol, message = %issue.message, "Instrument aborted");
        }
        info!(
            as_of = %report.as_of,
            complete = report.complete_count(),
            missing = report.missing_count(),
            "Scan report"
        );
        Ok(())
    }
}
