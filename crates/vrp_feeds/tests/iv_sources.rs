//! Implied volatility and price history sources against scripted providers.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use vrp_core::types::{
    Instrument, IvSource, MissingReason, VolUnit, VolatilityConvention, VolatilityReading,
};
use vrp_feeds::prelude::*;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

/// How a scripted call behaves.
#[derive(Clone)]
enum Script {
    RateLimited,
    Transport,
}

/// In-memory provider with per-call failure scripts and call counters.
#[derive(Default)]
struct ScriptedProvider {
    history: HashMap<(String, &'static str), Vec<HistoryRow>>,
    history_failure: Option<Script>,
    current_price: Option<f64>,
    expirations: Vec<NaiveDate>,
    chain: OptionChain,
    chain_failure: Option<Script>,
    observations: Vec<RawObservation>,
    macro_failure: Option<Script>,
    chain_calls: AtomicU32,
    macro_calls: AtomicU32,
    history_calls: AtomicU32,
}

impl ScriptedProvider {
    fn with_history(mut self, symbol: &str, lookback: Lookback, rows: Vec<HistoryRow>) -> Self {
        self.history
            .insert((symbol.to_string(), lookback.period()), rows);
        self
    }

    fn fail(script: &Option<Script>) -> Result<(), ProviderError> {
        match script {
            Some(Script::RateLimited) => Err(ProviderError::rate_limited("scripted")),
            Some(Script::Transport) => Err(ProviderError::transport("connection reset")),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn get_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Result<Vec<HistoryRow>, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.history_failure)?;
        Ok(self
            .history
            .get(&(symbol.to_string(), lookback.period()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_current_price(&self, _symbol: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.current_price)
    }
}

#[async_trait::async_trait]
impl OptionChainProvider for ScriptedProvider {
    async fn list_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, ProviderError> {
        self.chain_calls.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.chain_failure)?;
        Ok(self.expirations.clone())
    }

    async fn get_chain(
        &self,
        _symbol: &str,
        _expiration: NaiveDate,
    ) -> Result<OptionChain, ProviderError> {
        self.chain_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.clone())
    }
}

#[async_trait::async_trait]
impl MacroSeriesProvider for ScriptedProvider {
    async fn get_observations(
        &self,
        _series_id: &str,
    ) -> Result<Vec<RawObservation>, ProviderError> {
        self.macro_calls.fetch_add(1, Ordering::SeqCst);
        Self::fail(&self.macro_failure)?;
        Ok(self.observations.clone())
    }
}

fn source(provider: Arc<ScriptedProvider>) -> ImpliedVolSource {
    ImpliedVolSource::new(
        PriceHistorySource::new(provider.clone()),
        provider.clone(),
        provider,
    )
    .with_retry(RetryPolicy::immediate(5))
    .with_as_of(d(14))
}

fn obs(day: u32, value: &str) -> RawObservation {
    RawObservation {
        date: d(day),
        value: value.to_string(),
    }
}

fn spy() -> Instrument {
    Instrument::new(
        "SPY",
        VolatilityConvention::PercentOfPrice,
        IvSource::MacroSeries {
            series_id: "VIXCLS".to_string(),
        },
    )
}

fn gld() -> Instrument {
    Instrument::new(
        "GLD",
        VolatilityConvention::PercentOfPrice,
        IvSource::OptionChain { band: 5.0 },
    )
}

fn tnx() -> Instrument {
    Instrument::new(
        "^TNX",
        VolatilityConvention::BasisPointsOfYield,
        IvSource::QuotedIndex {
            index_symbol: "^MOVE".to_string(),
        },
    )
}

#[tokio::test]
async fn test_macro_series_skips_trailing_sentinels() {
    let provider = Arc::new(ScriptedProvider {
        observations: vec![obs(10, "12.5"), obs(11, "13.75"), obs(12, "."), obs(13, ".")],
        ..Default::default()
    });
    let reading = source(provider).fetch_iv(&spy()).await;
    assert_eq!(reading.value(), Some(13.75));
    assert_eq!(reading.as_of(), Some(d(11)));
    assert_eq!(reading.unit(), Some(VolUnit::Percent));
}

#[tokio::test]
async fn test_macro_series_all_sentinels_is_missing() {
    let provider = Arc::new(ScriptedProvider {
        observations: vec![obs(12, "."), obs(13, ".")],
        ..Default::default()
    });
    let reading = source(provider).fetch_iv(&spy()).await;
    assert!(matches!(
        reading.missing_reason(),
        Some(MissingReason::NoData { .. })
    ));
}

#[tokio::test]
async fn test_zero_expirations_is_missing() {
    let provider = Arc::new(ScriptedProvider {
        current_price: Some(215.0),
        ..Default::default()
    });
    let reading = source(provider).fetch_iv(&gld()).await;
    assert!(reading.is_missing());
}

#[tokio::test]
async fn test_chain_mean_in_percent() {
    let contract = |strike, iv| OptionContract {
        strike,
        implied_volatility: iv,
    };
    let provider = Arc::new(ScriptedProvider {
        current_price: Some(215.0),
        expirations: vec![d(7), d(21), d(28)],
        chain: OptionChain {
            calls: vec![contract(213.0, 0.14), contract(230.0, 0.40)],
            puts: vec![contract(217.0, 0.16), contract(215.0, 0.0)],
        },
        ..Default::default()
    });
    let reading = source(provider).fetch_iv(&gld()).await;
    let value = reading.value().unwrap();
    assert!((value - 15.0).abs() < 1e-9);
    assert_eq!(reading.unit(), Some(VolUnit::Percent));
}

#[tokio::test]
async fn test_chain_spot_falls_back_to_latest_close() {
    let contract = |strike, iv| OptionContract {
        strike,
        implied_volatility: iv,
    };
    let provider = ScriptedProvider {
        expirations: vec![d(21)],
        chain: OptionChain {
            calls: vec![contract(100.0, 0.20)],
            puts: vec![],
        },
        ..Default::default()
    }
    .with_history(
        "GLD",
        Lookback::FiveDays,
        vec![HistoryRow::close(d(13), 101.0)],
    );
    let reading = source(Arc::new(provider)).fetch_iv(&gld()).await;
    assert!((reading.value().unwrap() - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_persistent_rate_limit_gives_up_after_five_attempts() {
    let provider = Arc::new(ScriptedProvider {
        chain_failure: Some(Script::RateLimited),
        ..Default::default()
    });
    let reading = source(provider.clone()).fetch_iv(&gld()).await;
    assert_eq!(
        reading,
        VolatilityReading::missing(MissingReason::RateLimited { attempts: 5 })
    );
    assert_eq!(provider.chain_calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_chain_uses_first_listed_when_all_expired() {
    let provider = Arc::new(ScriptedProvider {
        current_price: Some(100.0),
        expirations: vec![d(7), d(10)],
        chain: OptionChain {
            calls: vec![OptionContract {
                strike: 100.0,
                implied_volatility: 0.20,
            }],
            puts: vec![],
        },
        ..Default::default()
    });
    let reading = source(provider).fetch_iv(&gld()).await;
    assert!((reading.value().unwrap() - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_macro_series_rate_limit_gives_up_after_five_attempts() {
    let provider = Arc::new(ScriptedProvider {
        macro_failure: Some(Script::RateLimited),
        ..Default::default()
    });
    let reading = source(provider.clone()).fetch_iv(&spy()).await;
    assert_eq!(
        reading,
        VolatilityReading::missing(MissingReason::RateLimited { attempts: 5 })
    );
    assert_eq!(provider.macro_calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_transport_error_is_not_retried() {
    let provider = Arc::new(ScriptedProvider {
        macro_failure: Some(Script::Transport),
        ..Default::default()
    });
    let reading = source(provider.clone()).fetch_iv(&spy()).await;
    assert!(matches!(
        reading.missing_reason(),
        Some(MissingReason::TransportFailure { .. })
    ));
    assert_eq!(provider.macro_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_quoted_index_falls_through_lookback_tiers() {
    let provider = ScriptedProvider::default()
        .with_history("^MOVE", Lookback::FiveDays, vec![])
        .with_history(
            "^MOVE",
            Lookback::OneMonth,
            vec![
                HistoryRow::close(d(3), 97.0),
                HistoryRow::close(d(4), 98.4),
                HistoryRow::close(d(5), f64::NAN),
            ],
        );
    let provider = Arc::new(provider);
    let reading = source(provider.clone()).fetch_iv(&tnx()).await;
    assert_eq!(reading.value(), Some(98.4));
    assert_eq!(reading.unit(), Some(VolUnit::BasisPoints));
    assert_eq!(reading.as_of(), Some(d(4)));
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quoted_index_missing_after_all_tiers() {
    let provider = Arc::new(ScriptedProvider::default());
    let reading = source(provider.clone()).fetch_iv(&tnx()).await;
    assert!(reading.is_missing());
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_history_uses_adjusted_close_when_close_absent() {
    let rows = vec![
        HistoryRow {
            date: d(3),
            close: None,
            adj_close: Some(4.21),
        },
        HistoryRow {
            date: d(4),
            close: None,
            adj_close: Some(4.25),
        },
    ];
    let provider = ScriptedProvider::default().with_history("^TNX", Lookback::OneYearBuffered, rows);
    let history = PriceHistorySource::new(Arc::new(provider));
    let series = history
        .fetch_price_history("^TNX", Lookback::OneYearBuffered)
        .await
        .unwrap();
    assert_eq!(series.last_valid(), Some((d(4), 4.25)));
}

#[tokio::test]
async fn test_history_transport_failure_is_empty() {
    let provider = ScriptedProvider {
        history_failure: Some(Script::Transport),
        ..Default::default()
    };
    let history = PriceHistorySource::new(Arc::new(provider));
    assert!(history
        .fetch_price_history("SPY", Lookback::OneYearBuffered)
        .await
        .is_none());
}

#[tokio::test]
async fn test_synthetic_provider_serves_default_watchlist() {
    let provider = Arc::new(SyntheticProvider::with_defaults(42, d(14)));
    let source = ImpliedVolSource::new(
        PriceHistorySource::new(provider.clone()),
        provider.clone(),
        provider,
    )
    .with_retry(RetryPolicy::immediate(1))
    .with_as_of(d(14));

    for instrument in Instrument::default_watchlist() {
        let reading = source.fetch_iv(&instrument).await;
        let value = reading.value().unwrap();
        assert!(value > 0.0, "{} IV {}", instrument.symbol, value);
        assert_eq!(reading.unit(), Some(instrument.unit()));
    }
}
