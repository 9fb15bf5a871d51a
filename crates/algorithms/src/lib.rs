//! # ptgrid Algorithms
//!
//! Turns scattered (x, y, z) samples into raster bands of per-cell
//! statistics.
//!
//! ## Modules
//!
//! - **gridding**: radius-bounded accumulation of count, min, max, mean,
//!   IDW and standard deviation, with window gap filling

pub mod gridding;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::gridding::{
        Bounds, Grid, GridParams, GriddedBands, IngestSummary, OutputTypes, SamplePoint,
        Statistic,
    };
    pub use ptgrid_core::prelude::*;
}
