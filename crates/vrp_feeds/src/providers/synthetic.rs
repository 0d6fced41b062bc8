//! Synthetic market data provider.
//!
//! Generates deterministic market data for demonstration and testing.
//!
//! ## Price Evolution Models
//!
//! - **Random Walk (GBM)**: equity, commodity and quoted volatility index levels
//! - **Mean Reversion (OU)**: yield levels, in percent
//!
//! Every symbol's path is seeded from the provider seed and the symbol name,
//! so repeated calls over different lookbacks see the same history.

use crate::error::ProviderError;
use crate::provider::{
    HistoryRow, Lookback, MacroSeriesProvider, OptionChain, OptionChainProvider, OptionContract,
    QuoteProvider, RawObservation, MISSING_SENTINEL,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::HashMap;

/// Trading days generated per symbol.
const HISTORY_DAYS: usize = 300;

/// Business days per year for the time step.
const BUSINESS_DAYS_PER_YEAR: f64 = 252.0;

/// Price evolution model for synthetic paths.
pub trait PriceEvolutionModel: Send + Sync {
    /// Evolve the level from the current state to the next.
    ///
    /// # Arguments
    /// * `current` - Current level
    /// * `dt` - Time step in years
    /// * `random_draw` - Standard normal random number
    fn evolve(&self, current: f64, dt: f64, random_draw: f64) -> f64;

    /// Annualised volatility of the model, in the model's natural unit.
    fn volatility(&self) -> f64;
}

/// Random Walk (Geometric Brownian Motion) model.
///
/// dS = μ*S*dt + σ*S*dW
#[derive(Debug, Clone)]
pub struct RandomWalkModel {
    /// Annual drift rate (μ)
    pub drift: f64,
    /// Annual volatility (σ)
    pub volatility: f64,
}

impl RandomWalkModel {
    /// Create a new Random Walk model.
    pub fn new(drift: f64, volatility: f64) -> Self {
        Self { drift, volatility }
    }

    /// Create with zero drift (martingale).
    pub fn zero_drift(volatility: f64) -> Self {
        Self::new(0.0, volatility)
    }
}

impl PriceEvolutionModel for RandomWalkModel {
    fn evolve(&self, current: f64, dt: f64, random_draw: f64) -> f64 {
        let drift_term = (self.drift - 0.5 * self.volatility * self.volatility) * dt;
        let diffusion_term = self.volatility * dt.sqrt() * random_draw;
        (current * (drift_term + diffusion_term).exp()).max(0.0001)
    }

    fn volatility(&self) -> f64 {
        self.volatility
    }
}

/// Mean Reversion (Ornstein-Uhlenbeck) model.
///
/// dX = κ*(θ - X)*dt + σ*dW
#[derive(Debug, Clone)]
pub struct MeanReversionModel {
    /// Mean reversion speed (κ)
    pub speed: f64,
    /// Long-term mean level (θ)
    pub mean_level: f64,
    /// Volatility (σ), in level units per year
    pub volatility: f64,
}

impl MeanReversionModel {
    /// Create a new Mean Reversion model.
    pub fn new(speed: f64, mean_level: f64, volatility: f64) -> Self {
        Self {
            speed,
            mean_level,
            volatility,
        }
    }

    /// Typical parameters for a yield quoted in percent: about 90bp a year.
    pub fn for_yields(mean_level: f64) -> Self {
        Self::new(0.3, mean_level, 0.9)
    }
}

impl PriceEvolutionModel for MeanReversionModel {
    fn evolve(&self, current: f64, dt: f64, random_draw: f64) -> f64 {
        // Exact OU discretisation
        let e_kt = (-self.speed * dt).exp();
        let mean = self.mean_level + (current - self.mean_level) * e_kt;
        let variance =
            self.volatility * self.volatility * (1.0 - e_kt * e_kt) / (2.0 * self.speed);
        mean + variance.sqrt() * random_draw
    }

    fn volatility(&self) -> f64 {
        self.volatility
    }
}

/// A symbol the synthetic provider knows.
pub struct SyntheticSymbol {
    /// Starting level
    pub initial: f64,
    /// Evolution model
    pub model: Box<dyn PriceEvolutionModel>,
    /// Whether the symbol is an index (no adjusted close)
    pub is_index: bool,
    /// Implied over realised vol ratio for the option chain
    pub iv_premium: f64,
}

/// Deterministic synthetic provider implementing all three capabilities.
pub struct SyntheticProvider {
    seed: u64,
    as_of: NaiveDate,
    symbols: HashMap<String, SyntheticSymbol>,
    macro_levels: HashMap<String, f64>,
}

impl SyntheticProvider {
    /// Create an empty provider. Add symbols with [`with_symbol`](Self::with_symbol).
    pub fn new(seed: u64, as_of: NaiveDate) -> Self {
        Self {
            seed,
            as_of,
            symbols: HashMap::new(),
            macro_levels: HashMap::new(),
        }
    }

    /// Provider pre-loaded with the default watchlist's symbols and series.
    pub fn with_defaults(seed: u64, as_of: NaiveDate) -> Self {
        Self::new(seed, as_of)
            .with_symbol("SPY", 520.0, Box::new(RandomWalkModel::new(0.06, 0.15)), false)
            .with_symbol("GLD", 215.0, Box::new(RandomWalkModel::zero_drift(0.14)), false)
            .with_symbol("^TNX", 4.30, Box::new(MeanReversionModel::for_yields(4.2)), true)
            .with_symbol("^MOVE", 100.0, Box::new(RandomWalkModel::zero_drift(0.35)), true)
            .with_macro_series("VIXCLS", 16.0)
    }

    /// Register a symbol
    pub fn with_symbol(
        mut self,
        symbol: &str,
        initial: f64,
        model: Box<dyn PriceEvolutionModel>,
        is_index: bool,
    ) -> Self {
        self.symbols.insert(
            symbol.to_string(),
            SyntheticSymbol {
                initial,
                model,
                is_index,
                iv_premium: 1.15,
            },
        );
        self
    }

    /// Register a macro series around `level`
    pub fn with_macro_series(mut self, series_id: &str, level: f64) -> Self {
        self.macro_levels.insert(series_id.to_string(), level);
        self
    }

    /// Reference date of the generated data
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    fn rng_for(&self, key: &str) -> StdRng {
        // FNV-1a over the key, mixed with the seed
        let hash = key.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        });
        StdRng::seed_from_u64(self.seed ^ hash)
    }

    /// The last `n` business days up to and including `as_of`, oldest first.
    fn business_days(&self, n: usize) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(n);
        let mut date = self.as_of;
        while days.len() < n {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                days.push(date);
            }
            date -= Duration::days(1);
        }
        days.reverse();
        days
    }

    fn entry(&self, symbol: &str) -> Result<&SyntheticSymbol, ProviderError> {
        self.symbols
            .get(symbol)
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.to_string()))
    }

    fn path(&self, symbol: &str) -> Result<Vec<(NaiveDate, f64)>, ProviderError> {
        let entry = self.entry(symbol)?;
        let mut rng = self.rng_for(symbol);
        let dt = 1.0 / BUSINESS_DAYS_PER_YEAR;
        let mut level = entry.initial;
        Ok(self
            .business_days(HISTORY_DAYS)
            .into_iter()
            .map(|date| {
                let point = (date, level);
                let z: f64 = rng.sample(StandardNormal);
                level = entry.model.evolve(level, dt, z);
                point
            })
            .collect())
    }

    fn spot(&self, symbol: &str) -> Result<f64, ProviderError> {
        self.path(symbol)?
            .last()
            .map(|(_, p)| *p)
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.to_string()))
    }

    /// Fridays after `as_of`, nearest first.
    fn expirations(&self, count: usize) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(count);
        let mut date = self.as_of + Duration::days(1);
        while out.len() < count {
            if date.weekday() == Weekday::Fri {
                out.push(date);
            }
            date += Duration::days(1);
        }
        out
    }
}

#[async_trait::async_trait]
impl QuoteProvider for SyntheticProvider {
    async fn get_history(
        &self,
        symbol: &str,
        lookback: Lookback,
    ) -> Result<Vec<HistoryRow>, ProviderError> {
        let is_index = self.entry(symbol)?.is_index;
        let cutoff = self.as_of - Duration::days(lookback.calendar_days());
        Ok(self
            .path(symbol)?
            .into_iter()
            .filter(|(date, _)| *date > cutoff)
            .map(|(date, level)| HistoryRow {
                date,
                close: Some(level),
                adj_close: if is_index { None } else { Some(level) },
            })
            .collect())
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        self.spot(symbol).map(Some)
    }
}

#[async_trait::async_trait]
impl OptionChainProvider for SyntheticProvider {
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, ProviderError> {
        let entry = self.entry(symbol)?;
        if entry.is_index {
            return Ok(Vec::new());
        }
        Ok(self.expirations(4))
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChain, ProviderError> {
        let entry = self.entry(symbol)?;
        let spot = self.spot(symbol)?;
        let atm_vol = entry.model.volatility() * entry.iv_premium;
        let mut rng = self.rng_for(&format!("{}:{}", symbol, expiration));

        let mut chain = OptionChain::default();
        let first = (spot * 0.85).floor() as i64;
        let last = (spot * 1.15).ceil() as i64;
        for strike in first..=last {
            let strike = strike as f64;
            let moneyness = (strike / spot).ln();
            // Mild smile plus quote noise
            let smile = atm_vol * (1.0 + 2.0 * moneyness * moneyness - 0.3 * moneyness);
            let noise: f64 = rng.gen_range(-0.005..0.005);
            chain.calls.push(OptionContract {
                strike,
                implied_volatility: smile + noise,
            });
            let noise: f64 = rng.gen_range(-0.005..0.005);
            chain.puts.push(OptionContract {
                strike,
                implied_volatility: smile + noise,
            });
        }
        Ok(chain)
    }
}

#[async_trait::async_trait]
impl MacroSeriesProvider for SyntheticProvider {
    async fn get_observations(
        &self,
        series_id: &str,
    ) -> Result<Vec<RawObservation>, ProviderError> {
        let level = *self
            .macro_levels
            .get(series_id)
            .ok_or_else(|| ProviderError::UnknownSymbol(series_id.to_string()))?;
        let mut rng = self.rng_for(series_id);
        let model = MeanReversionModel::new(5.0, level, level * 0.8);
        let dt = 1.0 / BUSINESS_DAYS_PER_YEAR;
        let days = self.business_days(60);
        let last = days.len() - 1;

        let mut value = level;
        Ok(days
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let z: f64 = rng.sample(StandardNormal);
                value = model.evolve(value, dt, z).max(5.0);
                // Holidays every few weeks and an unpublished latest day
                let text = if i % 17 == 16 || i == last {
                    MISSING_SENTINEL.to_string()
                } else {
                    format!("{:.2}", value)
                };
                RawObservation { date, value: text }
            })
            .collect())
    }
}
