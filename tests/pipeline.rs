use std::fs;

use serde_json::json;
use tempfile::tempdir;

use vfmap::config::FileConfig;
use vfmap::geometry::Bounds;
use vfmap::io::{read_cells, read_fields, write_map};
use vfmap::raster::GridFileSource;
use vfmap::{ApplicationParameters, DistributionMode, GridOrigin, PlanOptions, plan_field, update_vfm};

const FIELD: &str = r#"{
    "type": "Feature",
    "geometry": {
        "type": "Polygon",
        "coordinates": [[
            [141.3500, 43.0600],
            [141.3512, 43.0600],
            [141.3512, 43.0610],
            [141.3500, 43.0610],
            [141.3500, 43.0600]
        ]]
    },
    "properties": {"id": "north-12"}
}"#;

/// Humus grid covering the field with a gradient from 20 in the west to 60
/// in the east, plus a strip of missing values along the north edge
fn write_grid(path: &std::path::Path) {
    let bounds = Bounds {
        min_x: 141.349,
        max_x: 141.3522,
        min_y: 43.059,
        max_y: 43.062,
    };
    let (width, height) = (40usize, 40usize);
    let values: Vec<serde_json::Value> = (0..width * height)
        .map(|i| {
            let (row, col) = (i / width, i % width);
            if row < 2 {
                serde_json::Value::Null
            } else {
                json!(20.0 + 40.0 * col as f64 / (width - 1) as f64)
            }
        })
        .collect();

    let grid = json!({
        "bbox": bounds.to_web_mercator(),
        "width": width,
        "height": height,
        "values": values,
    });
    fs::write(path, grid.to_string()).unwrap();
}

#[test]
fn test_field_to_map_and_back() {
    let dir = tempdir().unwrap();
    let field_path = dir.path().join("field.geojson");
    let grid_path = dir.path().join("humus.json");
    let map_path = dir.path().join("map.geojson");

    fs::write(&field_path, FIELD).unwrap();
    write_grid(&grid_path);

    let field = read_fields(&field_path).unwrap().remove(0);
    assert_eq!(field.id.as_deref(), Some("north-12"));

    let source = GridFileSource::new(&grid_path);
    let options = PlanOptions::new(ApplicationParameters::new(100.0, 20.0)).with_buffer(2.0);
    let plan = plan_field(&field, &source, &options).unwrap();

    let map = &plan.map;
    assert!(map.cell_count() > 0);
    assert!(plan.stats.is_ok());
    assert!(map.cells.iter().any(|c| c.has_humus()));
    assert!(map.cells.windows(2).all(|w| w[0].humus_mean <= w[1].humus_mean));
    assert!(map.area_sum > 0.0);

    // Five steps around a base of 100 keep the area-weighted mean near 100
    let rate = map.mean_rate().unwrap();
    assert!((80.0..=120.0).contains(&rate), "mean rate {}", rate);

    write_map(&map_path, map).unwrap();
    let cells = read_cells(&map_path).unwrap();
    assert_eq!(cells.len(), map.cell_count());

    let doubled = update_vfm(
        &cells,
        &ApplicationParameters::new(200.0, 20.0).with_mode(DistributionMode::Steps),
    );
    assert_eq!(doubled.cell_count(), map.cell_count());
    assert!((doubled.area_sum - map.area_sum).abs() < 1e-6);
    assert!(doubled.amount_sum > map.amount_sum * 1.9);
}

#[test]
fn test_missing_grid_file_is_an_error() {
    let dir = tempdir().unwrap();
    let field = vfmap::io::parse_fields(FIELD).unwrap().remove(0);
    let source = GridFileSource::new(dir.path().join("absent.json"));

    let options = PlanOptions::new(ApplicationParameters::new(100.0, 20.0));
    assert!(plan_field(&field, &source, &options).is_err());
}

#[test]
fn test_config_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vfmap.toml");
    fs::write(
        &path,
        r#"
        grid_ew = 12.0
        origin = "se"
        base_amount = 80.0

        [raster]
        file = "humus.json"
        "#,
    )
    .unwrap();

    let config = FileConfig::from_path(&path).unwrap();
    assert_eq!(config.grid_ew, 12.0);
    assert_eq!(config.grid_ns, 20.0);
    assert_eq!(config.origin, GridOrigin::SouthEast);
    assert_eq!(config.base_amount, 80.0);
    assert_eq!(
        config.raster().file.as_deref(),
        Some(std::path::Path::new("humus.json"))
    );
    assert!(config.raster().url.is_none());

    assert!(FileConfig::from_path(&dir.path().join("missing.toml")).is_err());
}
