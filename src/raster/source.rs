use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::window::{GeoGrid, RasterWindow};
use crate::error::RasterError;

/// Anything that can return a window of raster samples for a bounding box
///
/// `bbox` is `[min_x, min_y, max_x, max_y]` in the raster's native
/// projection (Web Mercator for the humus maps). A read may block on I/O
/// and may fail; callers decide whether to retry.
pub trait RasterSource {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError>;
}

impl<T: RasterSource + ?Sized> RasterSource for &T {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        (**self).read(bbox, band)
    }
}

impl<T: RasterSource + ?Sized> RasterSource for Box<T> {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        (**self).read(bbox, band)
    }
}

impl RasterSource for GeoGrid {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        if band != 0 {
            return Err(RasterError::Decode(format!(
                "grid has a single band, requested band {}",
                band
            )));
        }
        Ok(self.crop(bbox))
    }
}

/// A [`GeoGrid`] stored as JSON on disk, re-read on every request
#[derive(Debug, Clone)]
pub struct GridFileSource {
    path: PathBuf,
}

impl GridFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<GeoGrid, RasterError> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl RasterSource for GridFileSource {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        debug!(path = %self.path.display(), ?bbox, "reading raster grid file");
        self.load()?.read(bbox, band)
    }
}

/// Try `primary`, and on failure try `fallback` exactly once
///
/// The usual pairing is a pooled, accelerated reader as primary and a plain
/// reader as fallback.
#[derive(Debug, Clone)]
pub struct RetryOnce<P, F> {
    primary: P,
    fallback: F,
}

impl<P: RasterSource, F: RasterSource> RetryOnce<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: RasterSource, F: RasterSource> RasterSource for RetryOnce<P, F> {
    fn read(&self, bbox: [f64; 4], band: usize) -> Result<RasterWindow, RasterError> {
        match self.primary.read(bbox, band) {
            Ok(window) => Ok(window),
            Err(first) => {
                warn!("raster read failed, retrying once: {}", first);
                self.fallback
                    .read(bbox, band)
                    .map_err(|retry| RasterError::RetryFailed {
                        first: Box::new(first),
                        retry: Box::new(retry),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Failing {
        calls: Cell<usize>,
    }

    impl RasterSource for Failing {
        fn read(&self, _bbox: [f64; 4], _band: usize) -> Result<RasterWindow, RasterError> {
            self.calls.set(self.calls.get() + 1);
            Err(RasterError::Status(503))
        }
    }

    fn grid() -> GeoGrid {
        GeoGrid::new([0.0, 0.0, 20.0, 20.0], RasterWindow::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap()
    }

    #[test]
    fn test_grid_rejects_other_bands() {
        assert!(grid().read([0.0, 0.0, 20.0, 20.0], 1).is_err());
    }

    #[test]
    fn test_retry_uses_fallback() {
        let primary = Failing {
            calls: Cell::new(0),
        };
        let source = RetryOnce::new(&primary, grid());

        let window = source.read([0.0, 0.0, 20.0, 20.0], 0).unwrap();
        assert_eq!(window.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(primary.calls.get(), 1);
    }

    #[test]
    fn test_retry_reports_both_failures() {
        let primary = Failing {
            calls: Cell::new(0),
        };
        let fallback = Failing {
            calls: Cell::new(0),
        };
        let source = RetryOnce::new(&primary, &fallback);

        let result = source.read([0.0, 0.0, 1.0, 1.0], 0);
        assert!(matches!(result, Err(RasterError::RetryFailed { .. })));
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = GridFileSource::new("/nonexistent/humus-grid.json");
        let result = source.read([0.0, 0.0, 1.0, 1.0], 0);
        assert!(matches!(result, Err(RasterError::Io(_))));
    }
}
