//! CSV directory provider.
//!
//! Layout under the root directory:
//!
//! ```text
//! prices/<SYMBOL>.csv    date,close,adj_close
//! macro/<SERIES>.csv     date,value
//! options/<SYMBOL>.csv   expiration,kind,strike,implied_volatility
//! ```
//!
//! A leading `^` is stripped from index symbols to form the file name, so
//! `^MOVE` reads `prices/MOVE.csv`. Either close column may be absent or blank.

use crate::error::ProviderError;
use crate::provider::{
    HistoryRow, Lookback, MacroSeriesProvider, OptionChain, OptionChainProvider, OptionContract,
    QuoteProvider, RawObservation,
};
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Provider reading CSV snapshots from a directory tree.
pub struct CsvDirectoryProvider {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    expiration: NaiveDate,
    kind: String,
    strike: f64,
    implied_volatility: f64,
}

#[derive(Debug, Deserialize)]
struct MacroRow {
    date: NaiveDate,
    value: String,
}

impl CsvDirectoryProvider {
    /// Create a provider over `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn file_for(&self, section: &str, symbol: &str) -> PathBuf {
        let stem = symbol.trim_start_matches('^');
        self.root.join(section).join(format!("{}.csv", stem))
    }

    async fn read_rows<T: DeserializeOwned>(
        &self,
        section: &str,
        symbol: &str,
    ) -> Result<Vec<T>, ProviderError> {
        let path = self.file_for(section, symbol);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::UnknownSymbol(symbol.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    async fn option_rows(&self, symbol: &str) -> Result<Vec<OptionRow>, ProviderError> {
        self.read_rows("options", symbol).await
    }
}

#[async_trait::async_trait]
impl QuoteProvider for CsvDirectoryProvider {
    async fn get_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Result<Vec<HistoryRow>, ProviderError> {
        let rows: Vec<HistoryRow> = self.read_rows("prices", symbol).await?;
        let Some(last) = rows.iter().map(|r| r.date).max() else {
            return Ok(rows);
        };
        let cutoff = last - Duration::days(lookback.calendar_days());
        Ok(rows.into_iter().filter(|r| r.date > cutoff).collect())
    }

    async fn get_current_price(&self, _symbol: &str) -> Result<Option<f64>, ProviderError> {
        // Snapshots carry no live quote; callers fall back to the latest close.
        Ok(None)
    }
}

#[async_trait::async_trait]
impl OptionChainProvider for CsvDirectoryProvider {
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, ProviderError> {
        let mut expirations: Vec<NaiveDate> = self
            .option_rows(symbol)
            .await?
            .into_iter()
            .map(|r| r.expiration)
            .collect();
        expirations.sort();
        expirations.dedup();
        Ok(expirations)
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChain, ProviderError> {
        let mut chain = OptionChain::default();
        for row in self.option_rows(symbol).await? {
            if row.expiration != expiration {
                continue;
            }
            let contract = OptionContract {
                strike: row.strike,
                implied_volatility: row.implied_volatility,
            };
            match row.kind.to_ascii_lowercase().as_str() {
                "call" | "c" => chain.calls.push(contract),
                "put" | "p" => chain.puts.push(contract),
                other => {
                    return Err(ProviderError::parse(format!(
                        "unknown option kind '{}' for {}",
                        other, symbol
                    )))
                }
            }
        }
        Ok(chain)
    }
}

#[async_trait::async_trait]
impl MacroSeriesProvider for CsvDirectoryProvider {
    async fn get_observations(
        &self,
        series_id: &str,
    ) -> Result<Vec<RawObservation>, ProviderError> {
        let mut rows: Vec<MacroRow> = self.read_rows("macro", series_id).await?;
        rows.sort_by_key(|r| r.date);
        Ok(rows
            .into_iter()
            .map(|r| RawObservation {
                date: r.date,
                value: r.value,
            })
            .collect())
    }
}
