//! Gridding of scattered samples into per-cell statistics
//!
//! A [`Grid`] turns an unordered stream of (x, y, z) samples into rasters of
//! count, min, max, mean, inverse-distance-weighted value and standard
//! deviation:
//! - every sample updates each cell whose center lies within the search
//!   radius, found by a quadrant walk around the sample's cell
//! - statistics are accumulated online (Welford for mean/variance)
//! - on finalization, cells that received no sample are either estimated
//!   from a window of populated neighbors or set to no-data

mod accumulator;
mod bands;
mod grid;
mod layout;
mod params;
mod search;
mod statistic;
mod window;

pub use accumulator::IDW_SNAP_DISTANCE;
pub use bands::{Band, GriddedBands};
pub use grid::{Grid, IngestSummary, PARALLEL_CELL_BUDGET};
pub use layout::CellLayout;
pub use params::{Bounds, GridParams};
pub use search::for_each_in_radius;
pub use statistic::{OutputTypes, Statistic};

/// A sample with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether coordinates and value are all finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<(f64, f64, f64)> for SamplePoint {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}
