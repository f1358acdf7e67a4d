use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// One band of raster samples read for a bounding box
///
/// Row-major, row 0 northernmost, column 0 westernmost. Missing values
/// (`null` on the wire, a short buffer, NaN) read as 0, the no-data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireWindow")]
pub struct RasterWindow {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

#[derive(Deserialize)]
struct WireWindow {
    width: usize,
    height: usize,
    #[serde(default)]
    values: Vec<Option<f64>>,
}

impl From<WireWindow> for RasterWindow {
    fn from(wire: WireWindow) -> Self {
        Self {
            width: wire.width,
            height: wire.height,
            values: wire.values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
        }
    }
}

impl RasterWindow {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Self {
        Self {
            width,
            height,
            values,
        }
    }

    /// Sample at a row-major index; anything missing or non-finite is 0
    pub fn value(&self, index: usize) -> f64 {
        self.values
            .get(index)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

/// A georeferenced single-band grid that can serve arbitrary windows
///
/// `bbox` is `[min_x, min_y, max_x, max_y]` in the grid's native projection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireGrid")]
pub struct GeoGrid {
    bbox: [f64; 4],
    window: RasterWindow,
}

#[derive(Deserialize)]
struct WireGrid {
    bbox: [f64; 4],
    width: usize,
    height: usize,
    #[serde(default)]
    values: Vec<Option<f64>>,
}

impl TryFrom<WireGrid> for GeoGrid {
    type Error = RasterError;

    fn try_from(wire: WireGrid) -> Result<Self, Self::Error> {
        let window = RasterWindow::from(WireWindow {
            width: wire.width,
            height: wire.height,
            values: wire.values,
        });
        GeoGrid::new(wire.bbox, window)
    }
}

impl GeoGrid {
    pub fn new(bbox: [f64; 4], window: RasterWindow) -> Result<Self, RasterError> {
        let [min_x, min_y, max_x, max_y] = bbox;
        if !bbox.iter().all(|v| v.is_finite()) || max_x <= min_x || max_y <= min_y {
            return Err(RasterError::Decode(format!("invalid grid extent {:?}", bbox)));
        }
        if window.is_empty() {
            return Err(RasterError::Decode("grid has no cells".to_string()));
        }
        Ok(Self { bbox, window })
    }

    pub fn bbox(&self) -> [f64; 4] {
        self.bbox
    }

    /// Whole pixels covering `bbox`; pixels outside the grid read as 0
    pub fn crop(&self, bbox: [f64; 4]) -> RasterWindow {
        let [gx0, gy0, gx1, gy1] = self.bbox;
        let px = (gx1 - gx0) / self.window.width as f64;
        let py = (gy1 - gy0) / self.window.height as f64;
        let [min_x, min_y, max_x, max_y] = bbox;

        let col0 = ((min_x - gx0) / px).floor();
        let col1 = ((max_x - gx0) / px).ceil();
        let row0 = ((gy1 - max_y) / py).floor();
        let row1 = ((gy1 - min_y) / py).ceil();

        if ![col0, col1, row0, row1].iter().all(|v| v.is_finite()) || col1 <= col0 || row1 <= row0 {
            return RasterWindow::new(0, 0, Vec::new());
        }

        let (col0, col1, row0, row1) = (col0 as i64, col1 as i64, row0 as i64, row1 as i64);
        let width = (col1 - col0) as usize;
        let height = (row1 - row0) as usize;
        let grid_w = self.window.width as i64;
        let grid_h = self.window.height as i64;

        let mut values = Vec::with_capacity(width * height);
        for row in row0..row1 {
            for col in col0..col1 {
                let inside = (0..grid_w).contains(&col) && (0..grid_h).contains(&row);
                values.push(if inside {
                    self.window.value((row * grid_w + col) as usize)
                } else {
                    0.0
                });
            }
        }

        RasterWindow::new(width, height, values)
    }
}
