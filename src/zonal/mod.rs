//! Per-cell humus aggregation
//!
//! Each cell takes the mean of the non-zero sample values strictly inside
//! it. A cell with no sample inside falls back to the nearest non-zero
//! sample within [`SEARCH_RADIUS_M`] of its centroid; a 10 m cell over a
//! 10 m raster can otherwise miss every pixel centre.

use geo::{BoundingRect, Centroid, Contains, Distance, Haversine, Intersects, Point, Polygon};
use rstar::{AABB, RTree, RTreeObject};
use tracing::debug;

use crate::domain::{FieldPolygon, MeshCell, SamplePoint};
use crate::geometry::Bounds;

/// Nearest-neighbour search radius, half the diagonal of a 10 m cell
pub const SEARCH_RADIUS_M: f64 = 7.1;

const SEARCH_RADIUS_KM: f64 = SEARCH_RADIUS_M / 1000.0;

struct SampleEntry(SamplePoint);

impl RTreeObject for SampleEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.0.position.x, self.0.position.y])
    }
}

struct SampleIndex {
    tree: RTree<SampleEntry>,
}

impl SampleIndex {
    fn new(samples: &[SamplePoint]) -> Self {
        Self {
            tree: RTree::bulk_load(samples.iter().copied().map(SampleEntry).collect()),
        }
    }

    fn query(&self, min: [f64; 2], max: [f64; 2]) -> impl Iterator<Item = &SamplePoint> {
        self.tree
            .locate_in_envelope(&AABB::from_corners(min, max))
            .map(|entry| &entry.0)
    }

    /// Mean of non-zero values strictly inside `polygon`
    ///
    /// `None` when no sample at all lies inside, `Some(0.0)` when only
    /// zero samples do.
    fn contained_mean(&self, polygon: &Polygon<f64>) -> Option<f64> {
        let rect = polygon.bounding_rect()?;
        let mut contained = 0usize;
        let mut count = 0usize;
        let mut sum = 0.0;

        for sample in self.query(rect.min().into(), rect.max().into()) {
            if !polygon.contains(&sample.point()) {
                continue;
            }
            contained += 1;
            if sample.is_valid() {
                count += 1;
                sum += sample.humus;
            }
        }

        match (contained, count) {
            (0, _) => None,
            (_, 0) => Some(0.0),
            _ => Some(sum / count as f64),
        }
    }

    /// Nearest non-zero sample within the search radius of `center`
    fn nearest_value(&self, center: Point<f64>) -> Option<f64> {
        let lon_deg_per_km = 1.0 / (111.32 * center.y().to_radians().cos());
        let half_lon = SEARCH_RADIUS_KM * lon_deg_per_km;
        let half_lat = SEARCH_RADIUS_KM / 111.0;

        self.query(
            [center.x() - half_lon, center.y() - half_lat],
            [center.x() + half_lon, center.y() + half_lat],
        )
        .filter(|sample| sample.is_valid())
        .map(|sample| (Haversine::distance(center, sample.point()), sample.humus))
        .filter(|(distance, _)| *distance <= SEARCH_RADIUS_M)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, humus)| humus)
    }
}

fn cell_center(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon
        .centroid()
        .or_else(|| Bounds::from_polygon(polygon).map(|b| Point::from(b.center())))
}

/// Fill `humus_mean` and `intersects` on every cell
///
/// Cells are returned in input order; empty `cells` or `samples` are fine
/// and leave every mean at 0.
pub fn compute_zonal_means(
    field: &FieldPolygon,
    cells: Vec<MeshCell>,
    samples: &[SamplePoint],
) -> Vec<MeshCell> {
    let index = SampleIndex::new(samples);
    let mut fallbacks = 0usize;

    let cells: Vec<MeshCell> = cells
        .into_iter()
        .map(|mut cell| {
            cell.humus_mean = match index.contained_mean(&cell.polygon) {
                Some(mean) => mean,
                None => {
                    fallbacks += 1;
                    cell_center(&cell.polygon)
                        .and_then(|center| index.nearest_value(center))
                        .unwrap_or(0.0)
                }
            };
            cell.intersects = cell.polygon.intersects(field.polygon());
            cell
        })
        .collect();

    debug!(
        cells = cells.len(),
        samples = samples.len(),
        fallbacks,
        "computed zonal means"
    );

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    /// Square cell of `size` degrees with its south-west corner at (x, y)
    fn cell(x: f64, y: f64, size: f64) -> MeshCell {
        MeshCell::new(Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
            ]),
            vec![],
        ))
    }

    fn field() -> FieldPolygon {
        FieldPolygon::new(vec![
            (141.3500, 43.0600),
            (141.3510, 43.0600),
            (141.3510, 43.0610),
            (141.3500, 43.0610),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_excludes_zero_values() {
        let samples = vec![
            SamplePoint::new(141.35002, 43.06002, 30.0),
            SamplePoint::new(141.35005, 43.06005, 0.0),
            SamplePoint::new(141.35008, 43.06008, 50.0),
        ];
        let cells = compute_zonal_means(&field(), vec![cell(141.35, 43.06, 0.0001)], &samples);

        assert!((cells[0].humus_mean - 40.0).abs() < 1e-12);
        assert!(cells[0].intersects);
    }

    #[test]
    fn test_only_zero_samples_give_no_data() {
        let samples = vec![SamplePoint::new(141.35005, 43.06005, 0.0)];
        let cells = compute_zonal_means(&field(), vec![cell(141.35, 43.06, 0.0001)], &samples);

        assert_eq!(cells[0].humus_mean, 0.0);
    }

    #[test]
    fn test_boundary_points_are_not_contained() {
        // The 70 sits on the west edge and is not inside the cell
        let samples = vec![
            SamplePoint::new(141.35, 43.06005, 70.0),
            SamplePoint::new(141.35005, 43.06005, 20.0),
        ];
        let cells = compute_zonal_means(&field(), vec![cell(141.35, 43.06, 0.0001)], &samples);

        assert_eq!(cells[0].humus_mean, 20.0);
    }

    #[test]
    fn test_nearest_fallback_within_radius() {
        // Non-zero samples about 6 m east and 6.5 m west of the centroid
        let c = cell(141.35, 43.06, 0.00009);
        let center = c.polygon.centroid().unwrap();
        let samples = vec![
            SamplePoint::new(center.x() + 0.000074, center.y(), 11.0),
            SamplePoint::new(center.x() + 0.000070, center.y(), 0.0),
            SamplePoint::new(center.x() + 0.000050, center.y(), 0.0),
            SamplePoint::new(center.x() - 0.000080, center.y(), 13.0),
        ];
        // none of these lie inside the cell
        assert!(samples.iter().all(|s| !c.polygon.contains(&s.point())));

        let cells = compute_zonal_means(&field(), vec![c], &samples);
        assert_eq!(cells[0].humus_mean, 11.0);
    }

    #[test]
    fn test_nearest_fallback_respects_radius() {
        let c = cell(141.35, 43.06, 0.00009);
        let center = c.polygon.centroid().unwrap();
        // about 12 m away
        let samples = vec![SamplePoint::new(center.x() + 0.00015, center.y(), 44.0)];

        let cells = compute_zonal_means(&field(), vec![c], &samples);
        assert_eq!(cells[0].humus_mean, 0.0);
    }

    #[test]
    fn test_intersects_unbuffered_field() {
        let inside = cell(141.3502, 43.0602, 0.0001);
        let touching = cell(141.3510, 43.0605, 0.0001);
        let outside = cell(141.3600, 43.0700, 0.0001);

        let cells = compute_zonal_means(&field(), vec![inside, touching, outside], &[]);

        assert!(cells[0].intersects);
        assert!(cells[1].intersects);
        assert!(!cells[2].intersects);
        assert!(cells.iter().all(|c| c.humus_mean == 0.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(compute_zonal_means(&field(), Vec::new(), &[]).is_empty());
    }
}
