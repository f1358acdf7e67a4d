use geo::{ChamberlainDuquetteArea, Polygon};

use crate::distribution::HumusKey;

/// Factor assigned to cells without a humus reading
pub const NO_DATA_FACTOR: f64 = -1.0;

/// One cell of the application grid
///
/// Created by the mesh generator with only `polygon` and `area` set; the
/// zonal step fills `humus_mean` and `intersects`, the assembly step fills
/// the two `amount_*` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshCell {
    /// Closed 4-vertex ring in (lon, lat)
    pub polygon: Polygon<f64>,
    /// Area in m²
    pub area: f64,
    /// Mean humus of the cell; 0 means no data
    pub humus_mean: f64,
    /// Whether the cell overlaps the unbuffered field
    pub intersects: bool,
    /// Relative adjustment in [-1, 1]; -1 means no data
    pub amount_fertilization_factor: f64,
    pub amount_fertilization_unit: u32,
}

impl MeshCell {
    pub fn new(polygon: Polygon<f64>) -> Self {
        let area = polygon.chamberlain_duquette_unsigned_area();
        Self {
            polygon,
            area,
            humus_mean: 0.0,
            intersects: false,
            amount_fertilization_factor: 0.0,
            amount_fertilization_unit: 0,
        }
    }

    /// Whether the mean is a real reading once quantized like a rate key
    pub fn has_humus(&self) -> bool {
        !HumusKey::from_value(self.humus_mean).is_no_data()
    }
}
