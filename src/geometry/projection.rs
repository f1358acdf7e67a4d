use geo::{Coord, MapCoords, Polygon};

/// Meters per degree of latitude (and of longitude at the equator)
const METERS_PER_DEGREE: f64 = 111320.0;

/// WGS84 semi-major axis used by Web Mercator (EPSG:3857)
const WEB_MERCATOR_RADIUS: f64 = 6378137.0;

/// Local equirectangular projection from WGS84 to meters around a pivot
///
/// Uses approximation suitable for field-scale geometry:
/// - x = (lon - center_lon) * cos(center_lat) * 111320
/// - y = (lat - center_lat) * 111320
///
/// The projection is conformal near the pivot, so rotating in this frame
/// keeps right angles, and `unproject` is the exact inverse of `project`.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    center: Coord<f64>,
    cos_lat: f64,
}

impl Projector {
    /// Create a new projector centered at the given (lon, lat) coordinate
    pub fn new(center: Coord<f64>) -> Self {
        Self {
            center,
            cos_lat: center.y.to_radians().cos(),
        }
    }

    /// Project a (lon, lat) coordinate to local meters
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.center.x) * self.cos_lat * METERS_PER_DEGREE,
            y: (c.y - self.center.y) * METERS_PER_DEGREE,
        }
    }

    /// Map local meters back to (lon, lat)
    pub fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.center.x + c.x / (self.cos_lat * METERS_PER_DEGREE),
            y: self.center.y + c.y / METERS_PER_DEGREE,
        }
    }

    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.project(c))
    }

    pub fn unproject_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.unproject(c))
    }
}

/// Convert a WGS84 (lon, lat) coordinate to Web Mercator meters
pub fn to_web_mercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-85.051_128_78, 85.051_128_78).to_radians();
    Coord {
        x: WEB_MERCATOR_RADIUS * c.x.to_radians(),
        y: WEB_MERCATOR_RADIUS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}
