use geo::{Intersects, Polygon};
use tracing::debug;

use super::source::RasterSource;
use super::window::RasterWindow;
use crate::domain::SamplePoint;
use crate::error::RasterError;
use crate::geometry::Bounds;

/// Turn a raster window into one point per pixel centre
///
/// Pixel positions are interpolated linearly across the geographic `bbox`
/// using the window's own width and height as the sampling resolution.
pub fn points_from_window(bbox: &Bounds, window: &RasterWindow) -> Vec<SamplePoint> {
    if window.is_empty() {
        return Vec::new();
    }

    let delta_lat = bbox.height() / window.height as f64;
    let delta_lng = bbox.width() / window.width as f64;

    let mut points = Vec::with_capacity(window.cell_count());
    for row in 0..window.height {
        let lat = bbox.max_y - delta_lat * (row as f64 + 0.5);
        for col in 0..window.width {
            let lng = bbox.min_x + delta_lng * (col as f64 + 0.5);
            points.push(SamplePoint::new(lng, lat, window.value(row * window.width + col)));
        }
    }

    points
}

/// Read the raster for a geographic bbox and return its pixel centres
pub fn sample_raster<S: RasterSource + ?Sized>(
    bbox: &Bounds,
    source: &S,
    band: usize,
) -> Result<Vec<SamplePoint>, RasterError> {
    let window = source.read(bbox.to_web_mercator(), band)?;
    debug!(
        width = window.width,
        height = window.height,
        "read raster window"
    );
    Ok(points_from_window(bbox, &window))
}

/// Keep the points inside `polygon`, boundary included
pub fn points_within(points: Vec<SamplePoint>, polygon: &Polygon<f64>) -> Vec<SamplePoint> {
    points
        .into_iter()
        .filter(|p| polygon.intersects(&p.point()))
        .collect()
}
