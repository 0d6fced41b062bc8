//! Price history retrieval.
//!
//! Normalises provider history tables into a [`PriceSeries`]. Failures never
//! cross this boundary: a transport error, an empty payload and an all-NaN
//! payload all come back as `None` after a warning, and the caller degrades.

use crate::provider::{HistoryRow, Lookback, QuoteProvider};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};
use vrp_core::types::PriceSeries;

/// Price history source over a quote provider.
#[derive(Clone)]
pub struct PriceHistorySource {
    provider: Arc<dyn QuoteProvider>,
}

impl PriceHistorySource {
    /// Create a new price history source
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    /// The underlying quote provider.
    pub fn provider(&self) -> &dyn QuoteProvider {
        self.provider.as_ref()
    }

    /// Fetch the close series for `symbol` over `lookback`.
    ///
    /// Returns `None` (the EMPTY sentinel) on any failure.
    pub async fn fetch_price_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Option<PriceSeries> {
        let rows = match self.provider.get_history(symbol, lookback).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    symbol,
                    period = lookback.period(),
                    error = %err,
                    "Price history fetch failed"
                );
                return None;
            }
        };

        let series = normalise_rows(&rows);
        if series.is_none() {
            debug!(
                symbol,
                period = lookback.period(),
                rows = rows.len(),
                "Price history empty"
            );
        }
        series
    }

    /// Latest valid close, walking the lookback tiers 5d, 1mo, 3mo until one
    /// yields a value.
    pub async fn latest_price(&self, symbol: &str) -> Option<(NaiveDate, f64)> {
        for lookback in Lookback::LATEST_PRICE_TIERS {
            if let Some(point) = self
                .fetch_price_history(symbol, lookback)
                .await
                .and_then(|series| series.last_valid())
            {
                return Some(point);
            }
        }
        warn!(symbol, "No price after all lookback tiers, market closed?");
        None
    }
}

/// Choose the close column and build a series.
///
/// The unadjusted close is used when any row carries one, the adjusted close
/// otherwise. Columns are never mixed within one series.
pub fn normalise_rows(rows: &[HistoryRow]) -> Option<PriceSeries> {
    if rows.is_empty() {
        return None;
    }

    let use_close = rows.iter().any(|r| r.close.is_some());
    let points = rows
        .iter()
        .map(|r| {
            let value = if use_close { r.close } else { r.adj_close };
            (r.date, value.unwrap_or(f64::NAN))
        })
        .collect();

    let series = PriceSeries::from_unsorted(points);
    if series.is_all_missing() {
        None
    } else {
        Some(series)
    }
}
