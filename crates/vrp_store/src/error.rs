//! Error types for the store and report sinks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while persisting history or publishing reports.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed history file
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// History file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// Report serialisation failure
    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
