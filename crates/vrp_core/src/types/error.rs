//! Error types for structured error handling.
//!
//! This module provides:
//! - `SeriesError`: Errors from price series construction
//! - `VrpError`: Errors from IV/RV reconciliation
//!
//! Insufficient data is deliberately not an error here: it is an expected
//! outcome and travels as a missing [`VolatilityReading`](super::VolatilityReading).

use super::instrument::VolUnit;
use chrono::NaiveDate;
use thiserror::Error;

/// Price series construction errors.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use vrp_core::types::SeriesError;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let err = SeriesError::DuplicateDate { date };
/// assert_eq!(format!("{}", err), "Duplicate date in series: 2024-03-01");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// Two points share the same date.
    #[error("Duplicate date in series: {date}")]
    DuplicateDate {
        /// The repeated date
        date: NaiveDate,
    },

    /// A point is dated before its predecessor.
    #[error("Series not in date order: {date} follows {previous}")]
    Unordered {
        /// Date of the earlier point
        previous: NaiveDate,
        /// Offending date
        date: NaiveDate,
    },
}

/// Reconciliation errors.
///
/// A unit mismatch is a configuration or programming error: percent vol was
/// about to be subtracted from basis-point vol. It aborts the computation for
/// one instrument, never the whole scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VrpError {
    /// Implied and realised readings are in different units.
    #[error("Unit mismatch: implied in {implied}, realised in {realized}")]
    UnitMismatch {
        /// Unit of the implied reading
        implied: VolUnit,
        /// Unit of the realised reading
        realized: VolUnit,
    },

    /// A reading is not in the unit the instrument's convention requires.
    #[error("Reading for {symbol} in {found}, convention requires {expected}")]
    ConventionMismatch {
        /// Instrument symbol
        symbol: String,
        /// Unit required by the instrument
        expected: VolUnit,
        /// Unit actually found
        found: VolUnit,
    },
}
