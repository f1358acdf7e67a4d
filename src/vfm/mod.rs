//! Variable-rate fertilization map assembly
//!
//! [`create_vfm`] runs zonal statistics and the rate distribution over a
//! fresh mesh. [`update_vfm`] re-applies new numeric parameters to cells
//! that already carry their humus means, without touching the raster.

pub mod pipeline;

pub use pipeline::{FieldPlan, PlanOptions, plan_field};

use tracing::debug;

use crate::distribution::{HumusAreaMap, HumusKey, distribute};
use crate::domain::{ApplicationParameters, FieldPolygon, MeshCell, SamplePoint};
use crate::zonal::compute_zonal_means;

/// A finished map: cells sorted by humus plus the totals over them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VfmMap {
    pub cells: Vec<MeshCell>,
    /// Area in m² of cells that receive fertilizer
    pub area_sum: f64,
    /// Total amount, in the unit of `base_amount` per 1000 m²
    pub amount_sum: f64,
}

impl VfmMap {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Amount per 1000 m² averaged over the fertilized area
    pub fn mean_rate(&self) -> Option<f64> {
        (self.area_sum > 0.0).then(|| self.amount_sum * 1000.0 / self.area_sum)
    }
}

/// Build the map for a fresh mesh
pub fn create_vfm(
    field: &FieldPolygon,
    mesh: Vec<MeshCell>,
    samples: &[SamplePoint],
    params: &ApplicationParameters,
) -> VfmMap {
    let cells = compute_zonal_means(field, mesh, samples);
    assemble(cells, params)
}

/// Recompute factors, units and totals for new parameters
///
/// `cells` is left untouched; the result holds updated copies.
pub fn update_vfm(cells: &[MeshCell], params: &ApplicationParameters) -> VfmMap {
    assemble(cells.to_vec(), params)
}

fn unit_for(base_amount: f64, factor: f64) -> u32 {
    // `as` saturates, so huge amounts clamp to u32::MAX
    (base_amount * (1.0 + factor)).round().max(0.0) as u32
}

fn assemble(mut cells: Vec<MeshCell>, params: &ApplicationParameters) -> VfmMap {
    cells.sort_by(|a, b| a.humus_mean.total_cmp(&b.humus_mean));

    let table = distribute(&HumusAreaMap::from_cells(&cells), params);
    let base = params.base_amount;

    let mut area_sum = 0.0;
    let mut amount_sum = 0.0;
    let mut interpolated = 0usize;

    for cell in &mut cells {
        let no_data = HumusKey::from_value(cell.humus_mean).is_no_data();

        if params.interpolate_missing && no_data && cell.intersects {
            // The total follows the emitted whole unit, not the raw base
            let unit = unit_for(base, 0.0);
            cell.amount_fertilization_factor = 0.0;
            cell.amount_fertilization_unit = unit;
            area_sum += cell.area;
            amount_sum += unit as f64 * cell.area / 1000.0;
            interpolated += 1;
            continue;
        }

        let factor = table.get(cell.humus_mean).unwrap_or(0.0);
        let unit = unit_for(base, factor);
        cell.amount_fertilization_factor = factor;
        cell.amount_fertilization_unit = unit;

        if unit != 0 {
            area_sum += cell.area;
        }
        amount_sum += unit as f64 * cell.area / 1000.0;
    }

    debug!(
        cells = cells.len(),
        rates = table.len(),
        interpolated,
        area_sum,
        amount_sum,
        "assembled map"
    );

    VfmMap {
        cells,
        area_sum,
        amount_sum,
    }
}
