use geo::{Coord, Point};

/// A raster cell centre carrying one humus reading; 0 means no data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Coord<f64>,
    pub humus: f64,
}

impl SamplePoint {
    pub fn new(lon: f64, lat: f64, humus: f64) -> Self {
        Self {
            position: Coord { x: lon, y: lat },
            humus,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::from(self.position)
    }

    pub fn is_valid(&self) -> bool {
        self.humus != 0.0
    }
}
