pub mod grid;
pub mod guard;

pub use grid::{GridOrigin, GridRounding, MIN_CELL_SIZE_M, MeshOptions, generate_mesh, rotate_cells};
pub use guard::{FINE_GRID_CELLS, MeshReport, check_grid};
