//! Error types for the map generation engine
//!
//! Only two kinds of failure are real errors here: malformed input geometry
//! and a failed raster read. Sparse data (empty mesh, no samples, all-zero
//! humus) always resolves to default values instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VfmError>;

#[derive(Debug, Error)]
pub enum VfmError {
    /// The field ring is degenerate, self-intersecting or non-finite
    #[error("invalid field geometry: {0}")]
    InvalidGeometry(String),

    #[error("buffer distance must not be negative (got {0} m)")]
    NegativeBuffer(f64),

    /// The mesh would exceed the caller's cell guard
    #[error("grid has {cells} cells which exceeds the limit of {limit}; use a larger cell size")]
    MeshTooLarge { cells: usize, limit: usize },

    #[error("invalid application parameter: {0}")]
    InvalidParameter(String),

    #[error("raster read failed: {0}")]
    Raster(#[from] RasterError),
}

/// Failures surfaced by a [`crate::raster::RasterSource`]
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to read raster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("raster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("raster service returned error status: {0}")]
    Status(u16),

    #[error("failed to decode raster window: {0}")]
    Decode(String),

    #[error("raster read failed ({first}) and the retry failed too ({retry})")]
    RetryFailed {
        first: Box<RasterError>,
        retry: Box<RasterError>,
    },
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::Decode(err.to_string())
    }
}
