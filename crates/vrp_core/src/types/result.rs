//! Reconciled VRP results.

use super::error::VrpError;
use super::instrument::{Instrument, VolUnit};
use super::reading::{MissingReason, VolatilityReading};
use crate::reconcile::reconcile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-instrument outcome of a scan.
///
/// Built fresh on every scan and never mutated afterwards. `vrp` is missing
/// whenever either input is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpResult {
    /// Instrument symbol
    pub symbol: String,
    /// Scan date
    pub as_of: NaiveDate,
    /// Unit shared by all three readings
    pub unit: VolUnit,
    /// Implied volatility
    pub implied: VolatilityReading,
    /// Realised volatility
    pub realized: VolatilityReading,
    /// Implied minus realised
    pub vrp: VolatilityReading,
}

impl VrpResult {
    /// Reconcile `implied` and `realized` for `instrument`.
    ///
    /// # Errors
    ///
    /// * `VrpError::ConventionMismatch` - If a present reading is not in the
    ///   instrument's unit
    /// * `VrpError::UnitMismatch` - If the two readings disagree on unit
    pub fn build(
        instrument: &Instrument,
        as_of: NaiveDate,
        implied: VolatilityReading,
        realized: VolatilityReading,
    ) -> Result<Self, VrpError> {
        let expected = instrument.unit();
        for reading in [&implied, &realized] {
            if let Some(found) = reading.unit() {
                if found != expected {
                    return Err(VrpError::ConventionMismatch {
                        symbol: instrument.symbol.clone(),
                        expected,
                        found,
                    });
                }
            }
        }

        let vrp = reconcile(&implied, &realized)?;
        Ok(Self {
            symbol: instrument.symbol.clone(),
            as_of,
            unit: expected,
            implied,
            realized,
            vrp,
        })
    }

    /// A result with every reading missing for the same reason.
    ///
    /// Used when an instrument's computation was aborted, so the report still
    /// carries a row for it.
    pub fn unavailable(instrument: &Instrument, as_of: NaiveDate, reason: MissingReason) -> Self {
        let missing = VolatilityReading::missing(reason);
        Self {
            symbol: instrument.symbol.clone(),
            as_of,
            unit: instrument.unit(),
            implied: missing.clone(),
            realized: missing.clone(),
            vrp: missing,
        }
    }

    /// Whether the VRP could be computed.
    pub fn is_complete(&self) -> bool {
        !self.vrp.is_missing()
    }
}

/// One date of a VRP-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VrpPoint {
    /// Date of the realised observation
    pub date: NaiveDate,
    /// Forward-filled implied volatility, if any has been observed yet
    pub implied: Option<f64>,
    /// Realised volatility on `date`
    pub realized: f64,
    /// Implied minus realised, undefined before the first implied observation
    pub vrp: Option<f64>,
}
