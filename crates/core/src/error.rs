//! Error types for ptgrid

use thiserror::Error;

/// Main error type for ptgrid operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid configuration: {name} = {value} ({reason})")]
    InvalidConfiguration {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid sample: ({x}, {y}, {z}) is not finite")]
    InvalidSample { x: f64, y: f64, z: f64 },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfiguration`] built from any displayable value.
    pub fn config(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for ptgrid operations
pub type Result<T> = std::result::Result<T, Error>;
