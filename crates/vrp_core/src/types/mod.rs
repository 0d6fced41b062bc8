//! Core types for volatility estimation.
//!
//! This module provides:
//! - `Instrument`, `VolatilityConvention`, `IvSource`: what is scanned and how
//! - `PriceSeries`: dated close prices or yield levels
//! - `VolatilityReading`, `VolatilitySeries`: annualised volatility, possibly missing
//! - `VrpResult`, `VrpPoint`: reconciled IV minus RV
//! - Error types: `SeriesError`, `VrpError`

pub mod error;
pub mod instrument;
pub mod reading;
pub mod result;
pub mod series;

pub use error::{SeriesError, VrpError};
pub use instrument::{Instrument, IvSource, IvSourceKind, VolUnit, VolatilityConvention};
pub use reading::{MissingReason, VolatilityReading, VolatilitySeries};
pub use result::{VrpPoint, VrpResult};
pub use series::PriceSeries;
