//! Finalized output bands

use ndarray::{Array2, ArrayView2};
use ptgrid_core::{GeoTransform, Raster};

use super::Statistic;

/// One statistic's values for every cell, indexed (row, col), row 0 at the top
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    statistic: Statistic,
    values: Array2<f64>,
}

impl Band {
    pub(crate) fn new(statistic: Statistic, values: Array2<f64>) -> Self {
        Self { statistic, values }
    }

    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }
}

/// The read-only result of [`Grid::finalize`](super::Grid::finalize).
///
/// Holds one band per requested statistic in band order (count, min, max,
/// mean, idw, stdev). Cells without an estimate hold the no-data value.
#[derive(Debug, Clone)]
pub struct GriddedBands {
    width: usize,
    height: usize,
    no_data: f64,
    transform: GeoTransform,
    bands: Vec<Band>,
}

impl GriddedBands {
    pub(crate) fn new(
        width: usize,
        height: usize,
        no_data: f64,
        transform: GeoTransform,
        bands: Vec<Band>,
    ) -> Self {
        Self {
            width,
            height,
            no_data,
            transform,
            bands,
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn no_data(&self) -> f64 {
        self.no_data
    }

    /// North-up transform of the grid extent
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Number of bands, one per requested statistic
    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, statistic: Statistic) -> Option<&Band> {
        self.bands.iter().find(|b| b.statistic == statistic)
    }

    /// Row-major values of a statistic (`width * height`, row 0 at the top),
    /// or `None` if it was not requested.
    pub fn data(&self, statistic: Statistic) -> Option<&[f64]> {
        self.band(statistic).and_then(|b| b.values.as_slice())
    }

    /// 2D view of a statistic, indexed (row, col)
    pub fn view(&self, statistic: Statistic) -> Option<ArrayView2<'_, f64>> {
        self.band(statistic).map(|b| b.values.view())
    }

    /// A statistic as a georeferenced raster carrying the no-data value
    pub fn raster(&self, statistic: Statistic) -> Option<Raster> {
        self.band(statistic).map(|b| {
            let mut raster = Raster::from_array(b.values.clone());
            raster.set_transform(self.transform);
            raster.set_nodata(Some(self.no_data));
            raster
        })
    }

    /// Every band with its row-major values, in band order
    pub fn bands(&self) -> impl Iterator<Item = (Statistic, &[f64])> + '_ {
        self.bands
            .iter()
            .filter_map(|b| b.values.as_slice().map(|data| (b.statistic, data)))
    }
}
