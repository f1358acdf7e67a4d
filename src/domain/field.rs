use geo::{ChamberlainDuquetteArea, Coord, Intersects, Line, LineString, Polygon};

use crate::error::{Result, VfmError};
use crate::geometry::Bounds;

/// A registered field boundary: one closed (lon, lat) ring, no holes
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPolygon {
    pub id: Option<String>,
    polygon: Polygon<f64>,
    /// Area in are (100 m²)
    area_are: f64,
}

impl FieldPolygon {
    /// Build a field from (lon, lat) pairs; the ring is closed if needed
    ///
    /// Fails on fewer than three distinct vertices, non-finite coordinates,
    /// a zero-area ring or crossing edges.
    pub fn new(ring: Vec<(f64, f64)>) -> Result<Self> {
        let coords: Vec<Coord<f64>> = ring.into_iter().map(Coord::from).collect();
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(VfmError::InvalidGeometry(
                "ring has non-finite coordinates".to_string(),
            ));
        }

        let polygon = Polygon::new(LineString::from(coords), vec![]);
        validate_ring(polygon.exterior())?;

        let area_are = polygon.chamberlain_duquette_unsigned_area() / 100.0;
        if area_are <= 0.0 {
            return Err(VfmError::InvalidGeometry("ring has zero area".to_string()));
        }

        Ok(Self {
            id: None,
            polygon,
            area_are,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Override the computed area with the registered one
    pub fn with_area_are(mut self, area_are: f64) -> Self {
        self.area_are = area_are;
        self
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn area_are(&self) -> f64 {
        self.area_are
    }

    pub fn bounds(&self) -> Bounds {
        // A validated ring always has at least three coordinates
        Bounds::from_polygon(&self.polygon).unwrap_or(Bounds {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
        })
    }
}

fn validate_ring(ring: &LineString<f64>) -> Result<()> {
    let mut distinct: Vec<Coord<f64>> = Vec::new();
    for c in ring.coords() {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(VfmError::InvalidGeometry(format!(
            "ring needs at least 3 distinct vertices, got {}",
            distinct.len()
        )));
    }

    // Non-adjacent edges must not touch
    let edges: Vec<Line<f64>> = ring.lines().filter(|l| l.start != l.end).collect();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return Err(VfmError::InvalidGeometry(format!(
                    "ring edges {} and {} cross",
                    i, j
                )));
            }
        }
    }

    Ok(())
}
