pub mod cell;
pub mod field;
pub mod params;
pub mod sample;

pub use cell::{MeshCell, NO_DATA_FACTOR};
pub use field::FieldPolygon;
pub use params::{ApplicationParameters, DistributionMode, FactorSteps};
pub use sample::SamplePoint;
