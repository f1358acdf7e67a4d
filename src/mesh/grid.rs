use clap::ValueEnum;
use geo::{Coord, Destination, Haversine, LineString, Point, Polygon, coord};
use serde::Deserialize;
use tracing::debug;

use super::guard::{MeshReport, check_grid};
use crate::domain::MeshCell;
use crate::error::{Result, VfmError};
use crate::geometry::{Bounds, rotate_polygon};

/// Cell sizes below this are raised to it to bound the cell count
pub const MIN_CELL_SIZE_M: f64 = 10.0;

/// Corner of the bounding box the grid walk starts from
///
/// Full-size cells start at the origin; the snapped, fractional cells end up
/// on the opposite edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
pub enum GridOrigin {
    /// Walk east then south
    #[default]
    #[serde(rename = "nw")]
    #[value(name = "nw")]
    NorthWest,
    /// Walk west then north
    #[serde(rename = "se")]
    #[value(name = "se")]
    SouthEast,
}

/// How the number of cells along an axis is derived from its extent
///
/// Both policies tile the bounding box exactly; they differ in what happens
/// to the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GridRounding {
    /// `floor(extent / size)` cells, the last one absorbing the remainder
    #[default]
    Floor,
    /// `ceil(extent / size)` cells, the last one partial
    Ceil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshOptions {
    pub origin: GridOrigin,
    pub rounding: GridRounding,
    /// Reject grids with more cells than this
    pub max_cells: Option<usize>,
}

/// Number of cells along one axis, never less than one
fn axis_count(extent_m: f64, cell_m: f64, rounding: GridRounding) -> usize {
    let ratio = extent_m / cell_m;
    let count = match rounding {
        GridRounding::Floor => ratio.floor(),
        GridRounding::Ceil => ratio.ceil(),
    };
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// Tile the bounding box of `polygon` with rectangular cells
///
/// `polygon` is expected to be rotated into mesh orientation already. Corners
/// are found by walking `ns_m` along bearing 180° (or 0°) and `ew_m` along
/// 90° (or 270°) with haversine destination math; the last row and column are
/// snapped to the bounding box so the grid never overshoots it.
///
/// # Returns
/// * The cells in walk order and a report of the grid shape
pub fn generate_mesh(
    polygon: &Polygon<f64>,
    ew_m: f64,
    ns_m: f64,
    options: &MeshOptions,
) -> Result<(Vec<MeshCell>, MeshReport)> {
    let ew = ew_m.max(MIN_CELL_SIZE_M);
    let ns = ns_m.max(MIN_CELL_SIZE_M);

    let bounds = Bounds::from_polygon(polygon)
        .ok_or_else(|| VfmError::InvalidGeometry("cannot mesh an empty ring".to_string()))?;

    let columns = axis_count(bounds.east_west_meters(), ew, options.rounding);
    let rows = axis_count(bounds.north_south_meters(), ns, options.rounding);
    let report = check_grid(rows, columns, options.max_cells)?;

    let walk = Walk::new(&bounds, options.origin);
    let mut cells = Vec::with_capacity(report.cell_count());
    let mut current = walk.start;

    for row in 1..=rows {
        for col in 1..=columns {
            let next_y = if row < rows {
                walk.clamp_y(step(current, walk.ns_bearing, ns).y)
            } else {
                walk.ns_snap
            };
            let next_x = if col < columns {
                walk.clamp_x(step(current, walk.ew_bearing, ew).x)
            } else {
                walk.ew_snap
            };

            cells.push(MeshCell::new(cell_polygon(current, next_x, next_y)));

            current = if col < columns {
                coord! { x: next_x, y: current.y }
            } else {
                coord! { x: walk.row_start, y: next_y }
            };
        }
    }

    debug!(
        rows,
        columns,
        ew_m = ew,
        ns_m = ns,
        "generated mesh of {} cells",
        cells.len()
    );

    Ok((cells, report))
}

/// Rotate every cell ring about `pivot`, keeping the cell attributes
pub fn rotate_cells(cells: Vec<MeshCell>, angle_deg: f64, pivot: Coord<f64>) -> Vec<MeshCell> {
    cells
        .into_iter()
        .map(|mut cell| {
            cell.polygon = rotate_polygon(&cell.polygon, angle_deg, pivot);
            cell
        })
        .collect()
}

/// Direction-dependent parameters of the grid walk
struct Walk {
    start: Coord<f64>,
    ew_bearing: f64,
    ns_bearing: f64,
    ew_snap: f64,
    ns_snap: f64,
    row_start: f64,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Walk {
    fn new(bounds: &Bounds, origin: GridOrigin) -> Self {
        let (start, ew_bearing, ns_bearing, ew_snap, ns_snap, row_start) = match origin {
            GridOrigin::NorthWest => (
                bounds.north_west(),
                90.0,
                180.0,
                bounds.max_x,
                bounds.min_y,
                bounds.min_x,
            ),
            GridOrigin::SouthEast => (
                bounds.south_east(),
                270.0,
                0.0,
                bounds.min_x,
                bounds.max_y,
                bounds.max_x,
            ),
        };

        Self {
            start,
            ew_bearing,
            ns_bearing,
            ew_snap,
            ns_snap,
            row_start,
            min_x: bounds.min_x,
            max_x: bounds.max_x,
            min_y: bounds.min_y,
            max_y: bounds.max_y,
        }
    }

    fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.min_x, self.max_x)
    }

    fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.min_y, self.max_y)
    }
}

fn step(from: Coord<f64>, bearing: f64, distance_m: f64) -> Coord<f64> {
    Haversine::destination(Point::from(from), bearing, distance_m).into()
}

/// Counter-clockwise ring (SW, SE, NE, NW) spanned by two opposite corners
fn cell_polygon(corner: Coord<f64>, x: f64, y: f64) -> Polygon<f64> {
    let (west, east) = (corner.x.min(x), corner.x.max(x));
    let (south, north) = (corner.y.min(y), corner.y.max(y));

    Polygon::new(
        LineString::from(vec![
            coord! { x: west, y: south },
            coord! { x: east, y: south },
            coord! { x: east, y: north },
            coord! { x: west, y: north },
        ]),
        vec![],
    )
}
