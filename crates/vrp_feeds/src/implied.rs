//! Implied volatility readings.
//!
//! One entry point, [`ImpliedVolSource::fetch_iv`], dispatching on the
//! instrument's [`IvSource`]:
//!
//! - **Macro series**: latest valid observation of a published volatility
//!   index, scanning backward past missing-day sentinels
//! - **Option chain**: mean implied vol of near-the-money calls and puts on
//!   the nearest expiration, converted from decimal to percent
//! - **Quoted index**: a volatility index traded as a price, read through the
//!   price history "latest price" tiers
//!
//! Option chain and macro calls are retried on rate limits; the quoted index
//! path shares the price history source and its tiered fallback instead.

use crate::history::PriceHistorySource;
use crate::provider::{MacroSeriesProvider, OptionChain, OptionChainProvider, RawObservation};
use crate::retry::{retry_rate_limited, RetryPolicy};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use vrp_core::types::{Instrument, IvSource, MissingReason, VolUnit, VolatilityReading};

/// Mean and median implied vol of the near-the-money contracts, as decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainIvSummary {
    /// Contracts inside the band
    pub count: usize,
    /// Mean implied volatility
    pub mean: f64,
    /// Median implied volatility
    pub median: f64,
}

impl ChainIvSummary {
    /// Summarise contracts with `|strike - spot| <= band`.
    ///
    /// Contracts with a non-finite or non-positive implied vol are stale
    /// quotes and are skipped. Returns `None` if nothing is left.
    pub fn from_chain(chain: &OptionChain, spot: f64, band: f64) -> Option<Self> {
        let mut vols: Vec<f64> = chain
            .contracts()
            .filter(|c| (c.strike - spot).abs() <= band)
            .map(|c| c.implied_volatility)
            .filter(|iv| iv.is_finite() && *iv > 0.0)
            .collect();
        if vols.is_empty() {
            return None;
        }

        vols.sort_by(|a, b| a.total_cmp(b));
        let count = vols.len();
        let mean = vols.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            vols[count / 2]
        } else {
            (vols[count / 2 - 1] + vols[count / 2]) / 2.0
        };
        Some(Self {
            count,
            mean,
            median,
        })
    }
}

/// Parse a macro observation, `None` for the sentinel or anything non-numeric.
pub fn parse_observation(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Latest parseable observation, scanning backward from the end.
pub fn latest_valid_observation(observations: &[RawObservation]) -> Option<(NaiveDate, f64)> {
    observations
        .iter()
        .rev()
        .find_map(|obs| parse_observation(&obs.value).map(|v| (obs.date, v)))
}

/// First expiration on or after `as_of`, or the first listed if all have passed.
pub fn nearest_expiration(expirations: &[NaiveDate], as_of: NaiveDate) -> Option<NaiveDate> {
    expirations
        .iter()
        .copied()
        .find(|e| *e >= as_of)
        .or_else(|| expirations.first().copied())
}

/// Implied volatility source.
#[derive(Clone)]
pub struct ImpliedVolSource {
    history: PriceHistorySource,
    chains: Arc<dyn OptionChainProvider>,
    macro_series: Arc<dyn MacroSeriesProvider>,
    retry: RetryPolicy,
    as_of: NaiveDate,
}

impl ImpliedVolSource {
    /// Create a new implied volatility source dated today.
    pub fn new(
        history: PriceHistorySource,
        chains: Arc<dyn OptionChainProvider>,
        macro_series: Arc<dyn MacroSeriesProvider>,
    ) -> Self {
        Self {
            history,
            chains,
            macro_series,
            retry: RetryPolicy::default(),
            as_of: Utc::now().date_naive(),
        }
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the reference date used to pick the nearest expiration
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    /// Read the current implied volatility for `instrument`.
    pub async fn fetch_iv(&self, instrument: &Instrument) -> VolatilityReading {
        let reading = match &instrument.iv_source {
            IvSource::MacroSeries { series_id } => {
                self.fetch_macro(series_id, instrument.unit()).await
            }
            IvSource::OptionChain { band } => self.fetch_chain(&instrument.symbol, *band).await,
            IvSource::QuotedIndex { index_symbol } => {
                self.fetch_quoted(index_symbol, instrument.unit()).await
            }
        };

        if let Some(reason) = reading.missing_reason() {
            info!(
                symbol = %instrument.symbol,
                source = instrument.iv_source.kind().name(),
                %reason,
                "No implied volatility reading"
            );
        }
        reading
    }

    async fn fetch_macro(&self, series_id: &str, unit: VolUnit) -> VolatilityReading {
        let provider = self.macro_series.as_ref();
        let observations = match retry_rate_limited(&self.retry, series_id, move || {
            provider.get_observations(series_id)
        })
        .await
        {
            Ok(observations) => observations,
            Err(reason) => return VolatilityReading::missing(reason),
        };

        match latest_valid_observation(&observations) {
            Some((date, value)) => VolatilityReading::present(value, unit, Some(date)),
            None => VolatilityReading::missing(MissingReason::no_data(format!(
                "no valid observation in {}",
                series_id
            ))),
        }
    }

    async fn fetch_chain(&self, symbol: &str, band: f64) -> VolatilityReading {
        let provider = self.chains.as_ref();

        let expirations = match retry_rate_limited(&self.retry, symbol, move || {
            provider.list_expirations(symbol)
        })
        .await
        {
            Ok(expirations) => expirations,
            Err(reason) => return VolatilityReading::missing(reason),
        };
        let Some(expiration) = nearest_expiration(&expirations, self.as_of) else {
            return VolatilityReading::missing(MissingReason::no_data(format!(
                "no expirations listed for {}",
                symbol
            )));
        };

        let Some(spot) = self.underlying_price(symbol).await else {
            return VolatilityReading::missing(MissingReason::no_data(format!(
                "no underlying price for {}",
                symbol
            )));
        };

        let chain = match retry_rate_limited(&self.retry, symbol, move || {
            provider.get_chain(symbol, expiration)
        })
        .await
        {
            Ok(chain) => chain,
            Err(reason) => return VolatilityReading::missing(reason),
        };

        match ChainIvSummary::from_chain(&chain, spot, band) {
            Some(summary) => {
                debug!(
                    symbol,
                    %expiration,
                    spot,
                    contracts = summary.count,
                    mean = summary.mean,
                    median = summary.median,
                    "Near-the-money implied volatility"
                );
                VolatilityReading::present(summary.mean * 100.0, VolUnit::Percent, Some(self.as_of))
            }
            None => VolatilityReading::missing(MissingReason::no_data(format!(
                "no contracts within {} of {} for {} {}",
                band, spot, symbol, expiration
            ))),
        }
    }

    /// Current price from the quote provider, falling back to the latest close.
    async fn underlying_price(&self, symbol: &str) -> Option<f64> {
        let quotes = self.history.provider();
        let current = retry_rate_limited(&self.retry, symbol, move || {
            quotes.get_current_price(symbol)
        })
        .await
        .ok()
        .flatten()
        .filter(|p| p.is_finite() && *p > 0.0);

        match current {
            Some(price) => Some(price),
            None => self.history.latest_price(symbol).await.map(|(_, p)| p),
        }
    }

    async fn fetch_quoted(&self, index_symbol: &str, unit: VolUnit) -> VolatilityReading {
        match self.history.latest_price(index_symbol).await {
            Some((date, level)) => VolatilityReading::present(level, unit, Some(date)),
            None => VolatilityReading::missing(MissingReason::no_data(format!(
                "no quote for {} in any lookback tier",
                index_symbol
            ))),
        }
    }
}
