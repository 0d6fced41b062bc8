//! # vrp_core: Foundation for Volatility Risk Premium estimation
//!
//! ## Layer 1 (Foundation) Role
//!
//! vrp_core is the bottom layer of the scanner workspace, providing:
//! - Instrument definitions and volatility conventions (`types::instrument`)
//! - Price series with strictly increasing dates (`types::series`)
//! - The missing-aware volatility reading sum type (`types::reading`)
//! - Per-instrument VRP results (`types::result`)
//! - Realised volatility estimation (`realized`)
//! - IV/RV reconciliation, scalar and over time (`reconcile`)
//! - Error types: `SeriesError`, `VrpError` (`types::error`)
//!
//! ## No I/O
//!
//! Nothing in this crate touches the network or the filesystem. Every function
//! is a pure transformation of its inputs, so the same numbers come out of a
//! scan, a backtest or a unit test.
//!
//! ## Usage Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use vrp_core::realized::compute_rv;
//! use vrp_core::reconcile::reconcile;
//! use vrp_core::types::{PriceSeries, VolUnit, VolatilityConvention, VolatilityReading};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let prices = [100.0, 101.0, 99.0, 102.0, 98.0, 105.0];
//! let series = PriceSeries::from_values(start, &prices).unwrap();
//!
//! // Too few observations for a 21 day window
//! let rv = compute_rv(&series, 21, VolatilityConvention::PercentOfPrice);
//! assert!(rv.is_missing());
//!
//! let iv = VolatilityReading::present(20.0, VolUnit::Percent, None);
//! let rv = VolatilityReading::present(15.0, VolUnit::Percent, None);
//! let vrp = reconcile(&iv, &rv).unwrap();
//! assert_eq!(vrp.value(), Some(5.0));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod realized;
pub mod reconcile;
pub mod types;
