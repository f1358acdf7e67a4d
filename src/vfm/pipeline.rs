use tracing::debug;

use super::{VfmMap, create_vfm};
use crate::domain::{ApplicationParameters, FieldPolygon};
use crate::error::{Result, VfmError};
use crate::geometry::{Bounds, buffer_polygon, compute_rotation, rotate_polygon};
use crate::mesh::{MeshOptions, MeshReport, generate_mesh, rotate_cells};
use crate::raster::{
    HumusStats, RasterSource, StatsUnavailable, humus_stats, points_from_window, points_within,
};

/// Extra margin around the buffered field when reading the raster, so cells
/// on the edge still find neighbouring samples
pub const SAMPLING_MARGIN_M: f64 = 10.0;

pub const DEFAULT_GRID_M: f64 = 20.0;

/// Everything besides the field and raster that a planning run needs
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    pub grid_ew_m: f64,
    pub grid_ns_m: f64,
    pub buffer_m: f64,
    /// Use this rotation instead of the minimal-area one
    pub rotation_deg: Option<u32>,
    pub mesh: MeshOptions,
    pub band: usize,
    pub params: ApplicationParameters,
}

impl PlanOptions {
    pub fn new(params: ApplicationParameters) -> Self {
        Self {
            grid_ew_m: DEFAULT_GRID_M,
            grid_ns_m: DEFAULT_GRID_M,
            buffer_m: 0.0,
            rotation_deg: None,
            mesh: MeshOptions::default(),
            band: 0,
            params,
        }
    }

    pub fn with_grid(mut self, ew_m: f64, ns_m: f64) -> Self {
        self.grid_ew_m = ew_m;
        self.grid_ns_m = ns_m;
        self
    }

    pub fn with_buffer(mut self, buffer_m: f64) -> Self {
        self.buffer_m = buffer_m;
        self
    }

    pub fn with_rotation(mut self, rotation_deg: Option<u32>) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshOptions) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }
}

/// Result of [`plan_field`]
#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub rotation_deg: u32,
    pub report: MeshReport,
    /// Statistics of the whole raster window that was read
    pub stats: std::result::Result<HumusStats, StatsUnavailable>,
    pub map: VfmMap,
}

/// Run the whole chain for one field
///
/// Buffer, orient and mesh the field, read the raster over the buffered
/// field plus [`SAMPLING_MARGIN_M`], then aggregate and distribute. Mesh and
/// parameter errors surface before the raster is touched.
pub fn plan_field<S: RasterSource + ?Sized>(
    field: &FieldPolygon,
    source: &S,
    options: &PlanOptions,
) -> Result<FieldPlan> {
    options.params.validate()?;
    for (name, size) in [("grid_ew", options.grid_ew_m), ("grid_ns", options.grid_ns_m)] {
        if !(size.is_finite() && size > 0.0) {
            return Err(VfmError::InvalidParameter(format!(
                "{} must be a positive length, got {}",
                name, size
            )));
        }
    }

    let buffered = buffer_polygon(field.polygon(), options.buffer_m)?;
    let pivot = Bounds::from_polygon(&buffered)
        .ok_or_else(|| VfmError::InvalidGeometry("buffered field is empty".to_string()))?
        .center();

    let rotation_deg = options
        .rotation_deg
        .unwrap_or_else(|| compute_rotation(&buffered));
    let angle = rotation_deg as f64;
    debug!(rotation_deg, buffer_m = options.buffer_m, "oriented field");

    let rotated = rotate_polygon(&buffered, angle, pivot);
    let (cells, report) = generate_mesh(
        &rotated,
        options.grid_ew_m,
        options.grid_ns_m,
        &options.mesh,
    )?;
    let cells = rotate_cells(cells, -angle, pivot);

    let extended = buffer_polygon(&buffered, SAMPLING_MARGIN_M)?;
    let window_bounds = Bounds::from_polygon(&extended)
        .ok_or_else(|| VfmError::InvalidGeometry("sampling window is empty".to_string()))?;

    let window = source.read(window_bounds.to_web_mercator(), options.band)?;
    let stats = humus_stats(&window);
    let points = points_within(points_from_window(&window_bounds, &window), &extended);
    debug!(
        width = window.width,
        height = window.height,
        kept = points.len(),
        "sampled raster"
    );

    let map = create_vfm(field, cells, &points, &options.params);

    Ok(FieldPlan {
        rotation_deg,
        report,
        stats,
        map,
    })
}
