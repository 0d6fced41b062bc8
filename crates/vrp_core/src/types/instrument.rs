//! Instrument definitions and volatility conventions.
//!
//! An [`Instrument`] fixes, for the lifetime of a scan, which formulas apply to
//! it: its [`VolatilityConvention`] selects the realised volatility estimator
//! and the unit of every reading, its [`IvSource`] selects where implied
//! volatility comes from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of an annualised volatility number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolUnit {
    /// Percent of price, e.g. 18.5 for 18.5% annualised vol.
    Percent,
    /// Basis points of yield, e.g. 95.0 for 95bp annualised vol.
    BasisPoints,
}

impl VolUnit {
    /// Short label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::BasisPoints => "bp",
        }
    }
}

impl fmt::Display for VolUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent => write!(f, "percent"),
            Self::BasisPoints => write!(f, "basis points"),
        }
    }
}

/// How volatility is measured for an instrument.
///
/// Price-like instruments move multiplicatively and are measured with log
/// returns. Yield levels move additively and are measured with first
/// differences, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityConvention {
    /// Log returns of a price, reported in percent.
    PercentOfPrice,
    /// First differences of a yield level, reported in basis points.
    BasisPointsOfYield,
}

impl VolatilityConvention {
    /// Unit every reading for this convention is expressed in.
    pub fn unit(&self) -> VolUnit {
        match self {
            Self::PercentOfPrice => VolUnit::Percent,
            Self::BasisPointsOfYield => VolUnit::BasisPoints,
        }
    }
}

/// Default near-the-money band, in price units either side of spot.
pub const DEFAULT_NTM_BAND: f64 = 5.0;

fn default_band() -> f64 {
    DEFAULT_NTM_BAND
}

/// Where an instrument's implied volatility is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IvSource {
    /// Latest valid observation of a published volatility index series.
    MacroSeries {
        /// Series identifier at the macro data provider
        series_id: String,
    },
    /// Mean implied vol of near-the-money options on the nearest expiry.
    OptionChain {
        /// Strike band either side of spot
        #[serde(default = "default_band")]
        band: f64,
    },
    /// A volatility index quoted as a price, read through the price history path.
    QuotedIndex {
        /// Ticker of the quoted index
        index_symbol: String,
    },
}

impl IvSource {
    /// The fieldless kind of this source.
    pub fn kind(&self) -> IvSourceKind {
        match self {
            Self::MacroSeries { .. } => IvSourceKind::MacroSeries,
            Self::OptionChain { .. } => IvSourceKind::OptionChain,
            Self::QuotedIndex { .. } => IvSourceKind::QuotedIndex,
        }
    }
}

/// Implied volatility provider modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IvSourceKind {
    /// Macro time-series provider
    MacroSeries,
    /// Derivatives chain provider
    OptionChain,
    /// Quoted index provider
    QuotedIndex,
}

impl IvSourceKind {
    /// Get the kind name for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::MacroSeries => "Macro Series",
            Self::OptionChain => "Option Chain",
            Self::QuotedIndex => "Quoted Index",
        }
    }
}

/// A scanned instrument.
///
/// Defined at configuration time and never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Symbol used by the price and option sources
    pub symbol: String,
    /// Human readable name
    #[serde(default)]
    pub name: String,
    /// Volatility convention
    pub convention: VolatilityConvention,
    /// Implied volatility source
    pub iv_source: IvSource,
}

impl Instrument {
    /// Create a new instrument.
    pub fn new(
        symbol: impl Into<String>,
        convention: VolatilityConvention,
        iv_source: IvSource,
    ) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
            convention,
            iv_source,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Unit of every reading for this instrument.
    pub fn unit(&self) -> VolUnit {
        self.convention.unit()
    }

    /// The default three-instrument watchlist: an equity index, a commodity
    /// and an interest rate proxy.
    pub fn default_watchlist() -> Vec<Instrument> {
        vec![
            Instrument::new(
                "SPY",
                VolatilityConvention::PercentOfPrice,
                IvSource::MacroSeries {
                    series_id: "VIXCLS".to_string(),
                },
            )
            .with_name("S&P 500"),
            Instrument::new(
                "GLD",
                VolatilityConvention::PercentOfPrice,
                IvSource::OptionChain {
                    band: DEFAULT_NTM_BAND,
                },
            )
            .with_name("Gold"),
            Instrument::new(
                "^TNX",
                VolatilityConvention::BasisPointsOfYield,
                IvSource::QuotedIndex {
                    index_symbol: "^MOVE".to_string(),
                },
            )
            .with_name("US 10Y Treasury"),
        ]
    }
}
