//! Persisted VRP history.
//!
//! One CSV file, one row per instrument per scan:
//!
//! ```text
//! date,symbol,implied,realized,vrp
//! 2024-06-14,SPY,12.75,10.31,2.44
//! 2024-06-14,GLD,,13.02,
//! ```
//!
//! Missing readings are empty fields. Every append reads the file in full,
//! concatenates the new rows and rewrites it through a temporary file in the
//! same directory. Repeated appends on the same date duplicate rows.
//!
//! The store is single writer. Concurrent processes appending to the same
//! file need an external lock.

use crate::error::StoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vrp_core::types::{VolUnit, VolatilitySeries, VrpResult};

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Scan date
    pub date: NaiveDate,
    /// Instrument symbol
    pub symbol: String,
    /// Implied volatility, if available
    pub implied: Option<f64>,
    /// Realised volatility, if available
    pub realized: Option<f64>,
    /// VRP, if available
    pub vrp: Option<f64>,
}

impl HistorySnapshot {
    /// Snapshot of `result` dated `date`.
    pub fn from_result(result: &VrpResult, date: NaiveDate) -> Self {
        Self {
            date,
            symbol: result.symbol.clone(),
            implied: result.implied.value(),
            realized: result.realized.value(),
            vrp: result.vrp.value(),
        }
    }
}

/// Handle to the history file.
///
/// Lifecycle is open → append → flush.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    rows: Vec<HistorySnapshot>,
}

impl HistoryStore {
    /// Open the store at `path`, loading existing rows. A missing file is an
    /// empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let rows = read_rows(&path)?;
        debug!(path = %path.display(), rows = rows.len(), "History store opened");
        Ok(Self { path, rows })
    }

    /// Path of the history file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows, oldest first.
    pub fn rows(&self) -> &[HistorySnapshot] {
        &self.rows
    }

    /// Rows for one symbol, oldest first.
    pub fn rows_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a HistorySnapshot> {
        self.rows.iter().filter(move |r| r.symbol == symbol)
    }

    /// Stored implied readings for `symbol` as a series.
    ///
    /// Missing readings are skipped. When a date appears more than once the
    /// last row wins.
    pub fn implied_series(&self, symbol: &str, unit: VolUnit) -> VolatilitySeries {
        let mut points: Vec<(NaiveDate, f64)> = self
            .rows_for(symbol)
            .filter_map(|r| r.implied.map(|v| (r.date, v)))
            .collect();
        points.sort_by_key(|(date, _)| *date);

        let mut series = VolatilitySeries::new(unit);
        for (date, value) in points {
            if series.points.last().is_some_and(|(last, _)| *last == date) {
                series.points.pop();
            }
            series.push(date, value);
        }
        series
    }

    /// Append one row per result, dated `as_of`, and rewrite the file.
    ///
    /// Rows already on disk are re-read first, so rows written by an earlier
    /// handle are kept.
    pub fn append(&mut self, results: &[VrpResult], as_of: NaiveDate) -> Result<(), StoreError> {
        let mut rows = read_rows(&self.path)?;
        rows.extend(results.iter().map(|r| HistorySnapshot::from_result(r, as_of)));
        write_rows(&self.path, &rows)?;

        info!(
            path = %self.path.display(),
            appended = results.len(),
            total = rows.len(),
            %as_of,
            "History appended"
        );
        self.rows = rows;
        Ok(())
    }

    /// Flush pending writes.
    ///
    /// Every append already rewrites the file, so there is nothing to do.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Percentile rank of `vrp` among the stored VRPs for `symbol`.
    ///
    /// Share of stored non-missing values less than or equal to `vrp`, in
    /// percent. `None` if the symbol has no stored VRP or `vrp` is not finite.
    pub fn percentile_rank(&self, symbol: &str, vrp: f64) -> Option<f64> {
        if !vrp.is_finite() {
            return None;
        }
        let stored: Vec<f64> = self.rows_for(symbol).filter_map(|r| r.vrp).collect();
        if stored.is_empty() {
            return None;
        }
        let at_or_below = stored.iter().filter(|v| **v <= vrp).count();
        Some(100.0 * at_or_below as f64 / stored.len() as f64)
    }
}

fn read_rows(path: &Path) -> Result<Vec<HistorySnapshot>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| StoreError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<HistorySnapshot>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

fn write_rows(path: &Path, rows: &[HistorySnapshot]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut writer = csv::Writer::from_path(&tmp).map_err(|e| StoreError::csv(&tmp, e))?;
        for row in rows {
            writer.serialize(row).map_err(|e| StoreError::csv(&tmp, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&tmp, e))?;
    }

    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
