//! Volatility readings with an explicit missing variant.
//!
//! Every number that leaves a source or estimator is a [`VolatilityReading`].
//! A failed fetch or a short history is a `Missing` reading carrying its
//! reason, never a NaN sentinel, so arithmetic downstream cannot pick it up by
//! accident.

use super::instrument::VolUnit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a reading has no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingReason {
    /// Network or parse failure talking to a provider.
    TransportFailure {
        /// Provider error message
        message: String,
    },
    /// Provider kept rejecting the request with a rate-limit signal.
    RateLimited {
        /// Number of attempts made
        attempts: u32,
    },
    /// Not enough valid observations for the computation.
    InsufficientData {
        /// Valid observations available
        got: usize,
        /// Valid observations required
        need: usize,
    },
    /// The provider answered but had nothing usable.
    NoData {
        /// What was empty
        detail: String,
    },
    /// The computation was rejected because units disagreed.
    UnitMismatch {
        /// Description of the mismatch
        detail: String,
    },
}

impl MissingReason {
    /// Build a transport failure reason.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
        }
    }

    /// Build a no-data reason.
    pub fn no_data(detail: impl Into<String>) -> Self {
        Self::NoData {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFailure { message } => write!(f, "transport failure: {}", message),
            Self::RateLimited { attempts } => {
                write!(f, "rate limited after {} attempts", attempts)
            }
            Self::InsufficientData { got, need } => {
                write!(f, "insufficient data: got {}, need {}", got, need)
            }
            Self::NoData { detail } => write!(f, "no data: {}", detail),
            Self::UnitMismatch { detail } => write!(f, "unit mismatch: {}", detail),
        }
    }
}

/// An annualised volatility number, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VolatilityReading {
    /// A finite value in `unit`.
    Value {
        /// Annualised volatility
        value: f64,
        /// Unit of `value`
        unit: VolUnit,
        /// Observation date, when the source reports one
        as_of: Option<NaiveDate>,
    },
    /// No value.
    Missing {
        /// Why the value is missing
        reason: MissingReason,
    },
}

impl VolatilityReading {
    /// Build a reading from a number.
    ///
    /// A non-finite number becomes a `Missing` reading, so NaN can never be
    /// stored as a value.
    pub fn present(value: f64, unit: VolUnit, as_of: Option<NaiveDate>) -> Self {
        if value.is_finite() {
            Self::Value { value, unit, as_of }
        } else {
            Self::missing(MissingReason::no_data(format!("non-finite value {}", value)))
        }
    }

    /// Build a missing reading.
    pub fn missing(reason: MissingReason) -> Self {
        Self::Missing { reason }
    }

    /// The value, if present.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::Missing { .. } => None,
        }
    }

    /// The unit, if a value is present.
    pub fn unit(&self) -> Option<VolUnit> {
        match self {
            Self::Value { unit, .. } => Some(*unit),
            Self::Missing { .. } => None,
        }
    }

    /// The observation date, if known.
    pub fn as_of(&self) -> Option<NaiveDate> {
        match self {
            Self::Value { as_of, .. } => *as_of,
            Self::Missing { .. } => None,
        }
    }

    /// Whether the reading is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    /// The missing reason, if missing.
    pub fn missing_reason(&self) -> Option<&MissingReason> {
        match self {
            Self::Value { .. } => None,
            Self::Missing { reason } => Some(reason),
        }
    }
}

impl fmt::Display for VolatilityReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { value, unit, .. } => write!(f, "{:.2}{}", value, unit.label()),
            Self::Missing { .. } => write!(f, "n/a"),
        }
    }
}

/// A dated volatility series in a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySeries {
    /// Unit of every value
    pub unit: VolUnit,
    /// Points in strictly increasing date order
    pub points: Vec<(NaiveDate, f64)>,
}

impl VolatilitySeries {
    /// Create an empty series.
    pub fn new(unit: VolUnit) -> Self {
        Self {
            unit,
            points: Vec::new(),
        }
    }

    /// Append a point. Points must be pushed in date order.
    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.points.push((date, value));
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The latest point as a reading.
    pub fn latest(&self) -> VolatilityReading {
        match self.points.last() {
            Some((date, value)) => VolatilityReading::present(*value, self.unit, Some(*date)),
            None => VolatilityReading::missing(MissingReason::no_data("empty series")),
        }
    }
}
