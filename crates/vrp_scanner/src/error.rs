//! Error types for the scanner.

use thiserror::Error;
use vrp_core::types::{MissingReason, VrpError};
use vrp_store::StoreError;

/// Scanner error type
#[derive(Debug, Error)]
pub enum ScanError {
    /// IV and RV could not be reconciled for an instrument
    #[error("{symbol}: {source}")]
    Reconcile {
        /// Instrument symbol
        symbol: String,
        /// Reconciliation failure
        #[source]
        source: VrpError,
    },

    /// An instrument's task died before producing a result
    #[error("{symbol}: task failed: {message}")]
    Task {
        /// Instrument symbol
        symbol: String,
        /// Join error description
        message: String,
    },

    /// History store or report sink failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ScanError {
    /// Create a reconcile error
    pub fn reconcile(symbol: impl Into<String>, source: VrpError) -> Self {
        Self::Reconcile {
            symbol: symbol.into(),
            source,
        }
    }

    /// Create a task error
    pub fn task(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Task {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Missing reason recorded on the instrument's readings.
    pub fn missing_reason(&self) -> MissingReason {
        match self {
            Self::Reconcile { source, .. } => MissingReason::UnitMismatch {
                detail: source.to_string(),
            },
            other => MissingReason::no_data(format!("computation aborted: {}", other)),
        }
    }
}
