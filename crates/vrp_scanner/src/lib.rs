//! # VRP Scanner
//!
//! Service layer of the workspace: estimates the volatility risk premium
//! (implied minus realised volatility) for a configured watchlist.
//!
//! ## Layers
//!
//! - `vrp_core`: readings, realised volatility, reconciliation (pure)
//! - `vrp_feeds`: providers, price history and implied volatility sources
//! - `vrp_store`: persisted history and report sinks
//! - `vrp_scanner` (this crate): configuration, scan orchestration, CLI
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use vrp_scanner::prelude::*;
//! use vrp_core::types::Instrument;
//! use vrp_feeds::prelude::{RetryPolicy, SyntheticProvider};
//!
//! # async fn run() {
//! let as_of = Utc::now().date_naive();
//! let provider = Arc::new(SyntheticProvider::with_defaults(42, as_of));
//! let sources = Sources::from_provider(provider, RetryPolicy::default(), as_of);
//! let scanner = Scanner::new(sources, ScanSettings { as_of, ..Default::default() });
//!
//! let report = scanner.scan(&Instrument::default_watchlist()).await;
//! for result in &report.results {
//!     println!("{} {}", result.symbol, result.vrp);
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod scan;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigError, ProviderKind, RetryConfig, ScannerConfig};
    pub use crate::error::ScanError;
    pub use crate::scan::{run_scan, ImpliedHistory, ScanRun, ScanSettings, Scanner, Sources};
}
