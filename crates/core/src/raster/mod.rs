//! Raster data structures

mod geotransform;
mod grid;
mod neighborhood;

pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::Window;
