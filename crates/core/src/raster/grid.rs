//! Georeferenced `f64` raster band

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use ndarray::{Array2, ArrayView2};

/// A georeferenced 2D band of `f64` cells.
///
/// Values are stored row-major with row 0 at the top (north) of the
/// extent, matching the buffers produced by the gridding engine.
///
/// # Example
///
/// ```
/// use ptgrid_core::Raster;
///
/// let mut raster = Raster::filled(2, 3, -9999.0);
/// raster.set_nodata(Some(-9999.0));
/// raster.set(1, 2, 42.0).unwrap();
///
/// assert_eq!(raster.get(1, 2).unwrap(), 42.0);
/// assert_eq!(raster.statistics().valid_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Raster {
    /// Cell values indexed (row, col)
    data: Array2<f64>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data sentinel, if any
    nodata: Option<f64>,
}

impl Raster {
    /// Create a raster filled with a value
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from a row-major buffer
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<f64>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            }),
        }
    }

    /// View of the cell values
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Row-major slice of the cell values
    pub fn values(&self) -> &[f64] {
        self.data
            .as_slice()
            .expect("raster storage is always in standard layout")
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<f64>) {
        self.nodata = nodata;
    }

    /// Cell size (square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Geographic coordinates of the center of cell (row, col)
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Whether a value is the no-data sentinel. NaN is always treated as no-data.
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || self.nodata == Some(value)
    }

    /// Min, max, mean and valid cell count, ignoring no-data cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter().filter(|&&v| !self.is_nodata(v)) {
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
            sum += value;
            count += 1;
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster band
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster = Raster::filled(10, 20, 0.0);
        assert_eq!(raster.rows(), 10);
        assert_eq!(raster.cols(), 20);
        assert_eq!(raster.shape(), (10, 20));
        assert_eq!(raster.values().len(), 200);
    }

    #[test]
    fn test_raster_access() {
        let mut raster = Raster::filled(4, 4, 0.0);
        raster.set(2, 3, 42.0).unwrap();
        assert_eq!(raster.get(2, 3).unwrap(), 42.0);
        assert_eq!(raster.values()[2 * 4 + 3], 42.0);
        assert!(raster.get(4, 0).is_err());
        assert!(raster.set(0, 4, 1.0).is_err());
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        assert!(matches!(
            Raster::from_vec(vec![0.0; 5], 2, 3),
            Err(Error::InvalidDimensions { width: 3, height: 2 })
        ));
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let mut raster = Raster::from_vec(vec![1.0, -9999.0, 3.0, f64::NAN], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.mean, Some(2.0));
        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.nodata_count, 2);
    }

    #[test]
    fn test_statistics_all_nodata() {
        let mut raster = Raster::filled(3, 3, -1.0);
        raster.set_nodata(Some(-1.0));
        let stats = raster.statistics();
        assert_eq!(stats.min, None);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.nodata_count, 9);
    }
}
