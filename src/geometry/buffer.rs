use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon, coord};

use super::{Bounds, Projector};
use crate::error::{Result, VfmError};

/// Segments used to approximate the round joins at each vertex
const CIRCLE_SEGMENTS: usize = 32;

/// Grow a (lon, lat) polygon outward by `distance_m` meters
///
/// The buffer is the union of the polygon with a capsule around every edge,
/// computed in a local metric frame. The outer ring of the largest resulting
/// part is kept, so the result is always a single ring without holes.
/// A zero distance returns the input unchanged.
pub fn buffer_polygon(polygon: &Polygon<f64>, distance_m: f64) -> Result<Polygon<f64>> {
    if distance_m < 0.0 || !distance_m.is_finite() {
        return Err(VfmError::NegativeBuffer(distance_m));
    }
    if distance_m == 0.0 {
        return Ok(polygon.clone());
    }

    let bounds = Bounds::from_polygon(polygon)
        .ok_or_else(|| VfmError::InvalidGeometry("cannot buffer an empty ring".to_string()))?;
    let projector = Projector::new(bounds.center());
    let local = projector.project_polygon(polygon);

    let mut merged = MultiPolygon::new(vec![Polygon::new(local.exterior().clone(), vec![])]);
    for line in local.exterior().lines() {
        let Some(capsule) = edge_capsule(line.start, line.end, distance_m) else {
            continue;
        };
        merged = merged.union(&MultiPolygon::new(vec![capsule]));
    }

    let largest = merged
        .0
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .ok_or_else(|| VfmError::InvalidGeometry("buffer produced an empty polygon".to_string()))?;

    let outer = Polygon::new(largest.exterior().clone(), vec![]);
    Ok(projector.unproject_polygon(&outer))
}

/// Rectangle around the segment joined with a disc at its start vertex
///
/// Every vertex starts exactly one edge of a closed ring, so the discs at the
/// start points cover every corner once.
fn edge_capsule(start: Coord<f64>, end: Coord<f64>, distance: f64) -> Option<Polygon<f64>> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-9 {
        return None;
    }

    let nx = -dy / len * distance;
    let ny = dx / len * distance;
    let rect = Polygon::new(
        LineString::from(vec![
            coord! { x: start.x + nx, y: start.y + ny },
            coord! { x: end.x + nx, y: end.y + ny },
            coord! { x: end.x - nx, y: end.y - ny },
            coord! { x: start.x - nx, y: start.y - ny },
        ]),
        vec![],
    );

    Some(rect.union(&disc(start, distance)).0.into_iter().next().unwrap_or(rect))
}

fn disc(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
            coord! {
                x: center.x + radius * theta.cos(),
                y: center.y + radius * theta.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{ChamberlainDuquetteArea, Contains, Point};

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (141.3500, 43.0600),
                (141.3510, 43.0600),
                (141.3510, 43.0608),
                (141.3500, 43.0608),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_zero_buffer_is_identity() {
        let field = square();
        assert_eq!(buffer_polygon(&field, 0.0).unwrap(), field);
    }

    #[test]
    fn test_negative_buffer_is_rejected() {
        let result = buffer_polygon(&square(), -5.0);
        assert!(matches!(result, Err(VfmError::NegativeBuffer(_))));
    }

    #[test]
    fn test_buffer_grows_and_contains_source() {
        let field = square();
        let buffered = buffer_polygon(&field, 10.0).unwrap();

        assert!(buffered.interiors().is_empty());
        assert!(
            buffered.chamberlain_duquette_unsigned_area()
                > field.chamberlain_duquette_unsigned_area()
        );
        for c in field.exterior().coords() {
            assert!(buffered.contains(&Point::from(*c)));
        }
    }

    #[test]
    fn test_buffer_reaches_requested_distance() {
        let field = square();
        let buffered = buffer_polygon(&field, 10.0).unwrap();
        let bounds = Bounds::from_polygon(&buffered).unwrap();
        let source = Bounds::from_polygon(&field).unwrap();

        // 10 m of latitude is about 0.0000898 degrees
        let grown = bounds.max_y - source.max_y;
        assert!((grown - 10.0 / 111320.0).abs() < 1e-6);
    }
}
