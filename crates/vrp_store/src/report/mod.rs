//! Scan reports and their destinations.

mod json_file;
mod log_sink;

pub use json_file::JsonFileSink;
pub use log_sink::LogSink;

use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vrp_core::types::{VrpPoint, VrpResult};

/// Report destination.
pub trait ReportSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Publish a report
    fn publish(&self, report: &ScanReport) -> Result<(), StoreError>;
}

/// An instrument whose computation was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    /// Instrument symbol
    pub symbol: String,
    /// What went wrong
    pub message: String,
}

/// Outcome of one scan over a watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Scan date
    pub as_of: NaiveDate,
    /// Wall clock time the scan finished
    pub generated_at: DateTime<Utc>,
    /// One result per watchlist instrument, in watchlist order
    pub results: Vec<VrpResult>,
    /// Instruments whose computation was aborted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ScanIssue>,
    /// VRP over time per symbol, when requested
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vrp_series: BTreeMap<String, Vec<VrpPoint>>,
    /// Percentile rank of each VRP among the symbol's stored history
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub percentile_ranks: BTreeMap<String, f64>,
}

impl ScanReport {
    /// Empty report dated `as_of`
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            generated_at: Utc::now(),
            results: Vec::new(),
            errors: Vec::new(),
            vrp_series: BTreeMap::new(),
            percentile_ranks: BTreeMap::new(),
        }
    }

    /// Result for `symbol`, if scanned
    pub fn result(&self, symbol: &str) -> Option<&VrpResult> {
        self.results.iter().find(|r| r.symbol == symbol)
    }

    /// Number of instruments with a computed VRP.
    pub fn complete_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_complete()).count()
    }

    /// Number of instruments whose VRP is missing.
    pub fn missing_count(&self) -> usize {
        self.results.len() - self.complete_count()
    }
}
