//! Offline provider implementations.
//!
//! The HTTP clients for live vendors live outside this workspace. These
//! providers answer the same capabilities from local data so a scan can run
//! end to end without network access.

mod csv_dir;
mod synthetic;

pub use csv_dir::CsvDirectoryProvider;
pub use synthetic::{
    MeanReversionModel, PriceEvolutionModel, RandomWalkModel, SyntheticProvider, SyntheticSymbol,
};
