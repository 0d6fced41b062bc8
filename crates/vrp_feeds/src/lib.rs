//! # Volatility Feeds
//!
//! Adapter layer between upstream market data providers and the numeric core.
//!
//! Providers are unreliable: they rate-limit, return empty windows near the
//! open or on holidays, name their close columns inconsistently and mark
//! missing macro observations with a sentinel instead of omitting them. This
//! crate absorbs all of that and hands the core one canonical shape.
//!
//! ## Modules
//!
//! - [`provider`]: Abstract provider capabilities (quotes, option chains, macro series)
//! - [`history`]: Price history retrieval with lookback tiers
//! - [`implied`]: Implied volatility readings per instrument
//! - [`retry`]: Bounded retry on rate-limit signals
//! - [`providers`]: Offline provider implementations (CSV directory, synthetic)

pub mod error;
pub mod history;
pub mod implied;
pub mod provider;
pub mod providers;
pub mod retry;

pub use error::ProviderError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::ProviderError;
    pub use crate::history::PriceHistorySource;
    pub use crate::implied::{ChainIvSummary, ImpliedVolSource};
    pub use crate::provider::{
        HistoryRow, Lookback, MacroSeriesProvider, OptionChain, OptionChainProvider,
        OptionContract, QuoteProvider, RawObservation,
    };
    pub use crate::providers::{CsvDirectoryProvider, SyntheticProvider};
    pub use crate::retry::RetryPolicy;
}
