//! JSON file report sink.

use super::{ReportSink, ScanReport};
use crate::error::StoreError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the report as pretty-printed JSON, replacing any previous file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Create a new JSON file sink
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonFileSink {
    fn name(&self) -> &str {
        "json"
    }

    fn publish(&self, report: &ScanReport) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(report)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(&self.path, &content).map_err(|e| StoreError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            size = content.len(),
            "Report written to file"
        );
        Ok(())
    }
}
