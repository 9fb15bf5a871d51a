//! # ptgrid Core
//!
//! Core types shared by the ptgrid crates.
//!
//! This crate provides:
//! - `Raster`: a georeferenced `f64` band with a no-data sentinel
//! - `GeoTransform`: affine transformation for georeferencing
//! - `Window`: clamped square neighborhoods over a grid
//! - `Error` / `Result`

pub mod error;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterStatistics, Window};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterStatistics, Window};
}
