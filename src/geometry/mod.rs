pub mod bounds;
pub mod buffer;
pub mod projection;
pub mod rotation;

pub use bounds::Bounds;
pub use buffer::buffer_polygon;
pub use projection::{Projector, to_web_mercator};
pub use rotation::{compute_rotation, rotate_polygon};
