//! vfmap - Variable-rate fertilization maps from field boundaries and humus rasters
//!
//! The engine fits a rotated grid to a field, samples a humus raster into
//! each cell and turns the per-cell humus into fertilizer amounts that
//! average out to a chosen base rate.

pub mod config;
pub mod distribution;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod raster;
pub mod vfm;
pub mod zonal;

pub use domain::{
    ApplicationParameters, DistributionMode, FactorSteps, FieldPolygon, MeshCell, SamplePoint,
};
pub use error::{RasterError, Result, VfmError};
pub use geometry::{buffer_polygon, compute_rotation, rotate_polygon};
pub use mesh::{GridOrigin, GridRounding, MeshOptions, MeshReport, generate_mesh};
pub use raster::{RasterSource, humus_stats, sample_raster};
pub use vfm::{FieldPlan, PlanOptions, VfmMap, create_vfm, plan_field, update_vfm};
pub use zonal::compute_zonal_means;
