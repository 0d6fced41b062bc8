//! # VRP Store
//!
//! Output layer of the scanner workspace.
//!
//! - [`history`]: The persisted per-day VRP history (CSV, full rewrite on append)
//! - [`report`]: Scan reports and the sinks that publish them (log, JSON file)

pub mod error;
pub mod history;
pub mod report;

pub use error::StoreError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::StoreError;
    pub use crate::history::{HistorySnapshot, HistoryStore};
    pub use crate::report::{JsonFileSink, LogSink, ReportSink, ScanIssue, ScanReport};
}
