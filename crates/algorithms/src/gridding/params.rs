//! Grid configuration

use ptgrid_core::{Error, GeoTransform, Result};
use serde::{Deserialize, Serialize};

use super::{OutputTypes, SamplePoint};

/// Upper bound on cells per band, so a single band stays addressable.
const MAX_CELLS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Parameters for a gridding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Cell edge length in world units
    pub edge_length: f64,
    /// Samples update every cell whose center is closer than this
    pub radius: f64,
    /// Value written to cells that end up without an estimate
    pub no_data: f64,
    /// Statistics to compute
    pub output_types: OutputTypes,
    /// Gap-fill window in cells; 0 writes `no_data` to empty cells instead
    pub window_size: usize,
    /// World X of the lower-left corner of the extent
    pub origin_x: f64,
    /// World Y of the lower-left corner of the extent
    pub origin_y: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            edge_length: 1.0,
            radius: std::f64::consts::SQRT_2,
            no_data: -9999.0,
            output_types: OutputTypes::all(),
            window_size: 0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl GridParams {
    /// Parameters covering `bounds` with square cells of `edge_length`.
    ///
    /// The grid gets `floor(extent / edge_length) + 1` cells on each axis so
    /// that samples lying on the max edge still fall inside it. The radius
    /// defaults to the cell diagonal.
    pub fn from_bounds(bounds: Bounds, edge_length: f64) -> Result<Self> {
        check_positive("edge_length", edge_length)?;
        bounds.validate()?;

        let cells = |extent: f64| -> Result<usize> {
            let n = (extent / edge_length).floor() + 1.0;
            if n >= MAX_CELLS as f64 {
                return Err(Error::config(
                    "edge_length",
                    edge_length,
                    format!("extent {} would need {} cells", extent, n),
                ));
            }
            Ok(n as usize)
        };

        Ok(Self {
            width: cells(bounds.width())?,
            height: cells(bounds.height())?,
            edge_length,
            radius: edge_length * std::f64::consts::SQRT_2,
            origin_x: bounds.min_x,
            origin_y: bounds.min_y,
            ..Self::default()
        })
    }

    /// Check the parameters before any buffer is allocated
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(Error::config("width", self.width, "must be positive"));
        }
        if self.height == 0 {
            return Err(Error::config("height", self.height, "must be positive"));
        }
        if self
            .width
            .checked_mul(self.height)
            .is_none_or(|n| n > MAX_CELLS)
        {
            return Err(Error::config(
                "width",
                format!("{}x{}", self.width, self.height),
                "grid has more cells than a band can address",
            ));
        }
        check_positive("edge_length", self.edge_length)?;
        check_positive("radius", self.radius)?;
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(Error::config(
                "origin",
                format!("({}, {})", self.origin_x, self.origin_y),
                "origin must be finite",
            ));
        }
        if self.output_types.is_empty() {
            return Err(Error::config(
                "output_types",
                "[]",
                "at least one statistic must be requested",
            ));
        }
        Ok(())
    }

    /// North-up transform of the grid extent
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::north_up(self.origin_x, self.origin_y, self.height, self.edge_length)
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(name, value, "must be a positive finite number"))
    }
}

/// Axis-aligned 2D extent in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest extent holding every finite sample, or `None` if there is none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a SamplePoint>,
    {
        points
            .into_iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Bounds>, p| {
                Some(match acc {
                    None => Bounds::new(p.x, p.y, p.x, p.y),
                    Some(b) => Bounds::new(
                        b.min_x.min(p.x),
                        b.min_y.min(p.y),
                        b.max_x.max(p.x),
                        b.max_y.max(p.y),
                    ),
                })
            })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(Error::config(
                "bounds",
                format!(
                    "({}, {}, {}, {})",
                    self.min_x, self.min_y, self.max_x, self.max_y
                ),
                "bounds must be finite with min <= max",
            ));
        }
        Ok(())
    }
}
