//! Provider capabilities.
//!
//! The scanner never talks to a concrete client library. Each upstream is
//! described by the capability it offers; any transport that can answer these
//! calls can be plugged in.

use crate::error::ProviderError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// History window requested from a quote provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback {
    /// Five trading days, for "latest price" reads
    FiveDays,
    /// One month
    OneMonth,
    /// Three months
    ThreeMonths,
    /// Roughly one trading year plus a buffer, for realised volatility
    OneYearBuffered,
}

impl Lookback {
    /// Fallback tiers for "latest price" reads, shortest first.
    pub const LATEST_PRICE_TIERS: [Lookback; 3] =
        [Lookback::FiveDays, Lookback::OneMonth, Lookback::ThreeMonths];

    /// Provider period string.
    pub fn period(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::OneYearBuffered => "400d",
        }
    }

    /// Calendar days covered by the window.
    pub fn calendar_days(&self) -> i64 {
        match self {
            Self::FiveDays => 7,
            Self::OneMonth => 31,
            Self::ThreeMonths => 92,
            Self::OneYearBuffered => 400,
        }
    }
}

/// One row of a provider's price history table.
///
/// Indices usually carry only `close`, tradable securities both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Trading date
    pub date: NaiveDate,
    /// Unadjusted close
    #[serde(default)]
    pub close: Option<f64>,
    /// Adjusted close
    #[serde(default)]
    pub adj_close: Option<f64>,
}

impl HistoryRow {
    /// Row with a close only.
    pub fn close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
            adj_close: None,
        }
    }
}

/// One option contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Strike price
    pub strike: f64,
    /// Implied volatility as a decimal fraction (0.18 for 18%)
    pub implied_volatility: f64,
}

/// Calls and puts for one expiration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    /// Call contracts
    pub calls: Vec<OptionContract>,
    /// Put contracts
    pub puts: Vec<OptionContract>,
}

impl OptionChain {
    /// Calls and puts together.
    pub fn contracts(&self) -> impl Iterator<Item = &OptionContract> {
        self.calls.iter().chain(self.puts.iter())
    }

    /// Whether the chain has no contracts.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

/// Raw macro series observation, value still in provider form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Observation date
    pub date: NaiveDate,
    /// Numeric string, or the missing sentinel
    pub value: String,
}

/// Sentinel the macro provider uses for a missing observation.
pub const MISSING_SENTINEL: &str = ".";

/// Price and quote capability.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Historical close table for `symbol` over `lookback`.
    async fn get_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Result<Vec<HistoryRow>, ProviderError>;

    /// Current price, if the provider publishes one.
    async fn get_current_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError>;
}

/// Option chain capability.
#[async_trait::async_trait]
pub trait OptionChainProvider: Send + Sync {
    /// Listed expirations in ascending order.
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, ProviderError>;

    /// Chain for one expiration.
    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChain, ProviderError>;
}

/// Macro time-series capability.
#[async_trait::async_trait]
pub trait MacroSeriesProvider: Send + Sync {
    /// All observations of `series_id` in ascending date order.
    async fn get_observations(&self, series_id: &str)
        -> Result<Vec<RawObservation>, ProviderError>;
}
