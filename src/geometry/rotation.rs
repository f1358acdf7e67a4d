use geo::{ChamberlainDuquetteArea, Coord, Point, Polygon, Rotate};

use super::{Bounds, Projector};

/// Rotate a (lon, lat) polygon about a pivot
///
/// The rotation happens in a local metric frame centred on the pivot so that
/// right angles survive at field scale. Positive angles turn clockwise, which
/// keeps the convention of the mesh code: rotating by `deg` and then by
/// `-deg` around the same pivot returns the original ring.
pub fn rotate_polygon(polygon: &Polygon<f64>, angle_deg: f64, pivot: Coord<f64>) -> Polygon<f64> {
    if angle_deg == 0.0 {
        return polygon.clone();
    }

    let projector = Projector::new(pivot);
    let local = projector.project_polygon(polygon);

    // geo rotates counter-clockwise for positive angles
    let rotated = local.rotate_around_point(-angle_deg, Point::new(0.0, 0.0));

    projector.unproject_polygon(&rotated)
}

/// Area in m² of the axis-aligned bounding box of `polygon` after rotating it
pub fn rotated_bbox_area(polygon: &Polygon<f64>, angle_deg: f64, pivot: Coord<f64>) -> f64 {
    let rotated = rotate_polygon(polygon, angle_deg, pivot);
    Bounds::from_polygon(&rotated)
        .map(|b| b.to_polygon().chamberlain_duquette_unsigned_area())
        .unwrap_or(0.0)
}

/// Find the whole-degree rotation in `0..=90` whose bounding box is smallest
///
/// Every degree is tried and a degree replaces the current best only when
/// its area is strictly smaller, so on exact ties the first degree wins.
pub fn compute_rotation(polygon: &Polygon<f64>) -> u32 {
    let Some(bounds) = Bounds::from_polygon(polygon) else {
        return 0;
    };
    let pivot = bounds.center();

    let mut best_deg = 0;
    let mut best_area = f64::INFINITY;

    for deg in 0..=90u32 {
        let area = rotated_bbox_area(polygon, deg as f64, pivot);
        if area < best_area {
            best_area = area;
            best_deg = deg;
        }
    }

    best_deg
}
