use geo::{Coord, Distance, Haversine, Point, Polygon, Rect, coord};

use super::projection::to_web_mercator;

/// Axis-aligned bounding box in (lon, lat) degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of coordinates
    pub fn from_coords(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;

        let mut bounds = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        bounds.expand(iter);
        Some(bounds)
    }

    pub fn from_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        Self::from_coords(polygon.exterior().coords().copied())
    }

    /// Expand bounds to include more coordinates
    pub fn expand(&mut self, coords: impl IntoIterator<Item = Coord<f64>>) {
        for c in coords {
            self.min_x = self.min_x.min(c.x);
            self.max_x = self.max_x.max(c.x);
            self.min_y = self.min_y.min(c.y);
            self.max_y = self.max_y.max(c.y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn north_west(&self) -> Coord<f64> {
        coord! { x: self.min_x, y: self.max_y }
    }

    pub fn north_east(&self) -> Coord<f64> {
        coord! { x: self.max_x, y: self.max_y }
    }

    pub fn south_east(&self) -> Coord<f64> {
        coord! { x: self.max_x, y: self.min_y }
    }

    pub fn south_west(&self) -> Coord<f64> {
        coord! { x: self.min_x, y: self.min_y }
    }

    /// Center of the box, used as the rotation pivot
    pub fn center(&self) -> Coord<f64> {
        coord! {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Great-circle length of the northern edge in meters
    pub fn east_west_meters(&self) -> f64 {
        Haversine::distance(Point::from(self.north_west()), Point::from(self.north_east()))
    }

    /// Great-circle length of the western edge in meters
    pub fn north_south_meters(&self) -> f64 {
        Haversine::distance(Point::from(self.south_west()), Point::from(self.north_west()))
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(self.south_west(), self.north_east()).to_polygon()
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// The same box expressed in Web Mercator meters
    pub fn to_web_mercator(&self) -> [f64; 4] {
        let min = to_web_mercator(self.south_west());
        let max = to_web_mercator(self.north_east());
        [min.x, min.y, max.x, max.y]
    }
}
