pub mod geojson;

pub use geojson::{
    GeoJsonError, map_to_geojson, parse_cells, parse_fields, read_cells, read_fields, write_map,
};
