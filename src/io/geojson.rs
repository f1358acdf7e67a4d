use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo::{LineString, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::domain::{FieldPolygon, MeshCell};
use crate::error::VfmError;
use crate::vfm::VfmMap;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no polygon found in GeoJSON input")]
    NoPolygon,

    #[error(transparent)]
    Geometry(#[from] VfmError),
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection { features: Vec<Feature> },
    Feature(Feature),
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    #[serde(other)]
    Other,
}

impl Geometry {
    /// Outer ring of the polygon, or of the first part of a multipolygon
    fn exterior(&self) -> Option<&[Position]> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|rings| rings.first())
                .map(Vec::as_slice),
            Geometry::Other => None,
        }
    }

    fn polygon(&self) -> Option<Polygon<f64>> {
        self.exterior()
            .map(|ring| Polygon::new(LineString::from(to_pairs(ring)), vec![]))
    }
}

fn to_pairs(ring: &[Position]) -> Vec<(f64, f64)> {
    ring.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn property_f64(properties: &Map<String, Value>, key: &str) -> Option<f64> {
    properties.get(key).and_then(Value::as_f64)
}

impl Feature {
    fn into_field(self) -> Option<Result<FieldPolygon, GeoJsonError>> {
        let ring = to_pairs(self.geometry.as_ref()?.exterior()?);
        let properties = self.properties.unwrap_or_default();

        let field = FieldPolygon::new(ring).map(|mut field| {
            let id = properties
                .get("id")
                .and_then(id_string)
                .or_else(|| self.id.as_ref().and_then(id_string));
            if let Some(id) = id {
                field = field.with_id(id);
            }
            if let Some(area) = property_f64(&properties, "area") {
                field = field.with_area_are(area);
            }
            field
        });

        Some(field.map_err(GeoJsonError::from))
    }
}

fn read_text(path: &Path) -> Result<String, GeoJsonError> {
    std::fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse every polygon feature of a GeoJSON document into a field
///
/// Accepts a FeatureCollection, a single Feature or a bare Polygon or
/// MultiPolygon geometry. Non-polygon features are skipped. The field id is
/// taken from `properties.id` or the feature id, and a numeric
/// `properties.area` (in are) overrides the computed area.
pub fn parse_fields(json: &str) -> Result<Vec<FieldPolygon>, GeoJsonError> {
    let document: Document = serde_json::from_str(json)?;

    let features = match document {
        Document::FeatureCollection { features } => features,
        Document::Feature(feature) => vec![feature],
        Document::Polygon { coordinates } => vec![Feature {
            id: None,
            geometry: Some(Geometry::Polygon { coordinates }),
            properties: None,
        }],
        Document::MultiPolygon { coordinates } => vec![Feature {
            id: None,
            geometry: Some(Geometry::MultiPolygon { coordinates }),
            properties: None,
        }],
    };

    let fields = features
        .into_iter()
        .filter_map(Feature::into_field)
        .collect::<Result<Vec<_>, _>>()?;

    if fields.is_empty() {
        return Err(GeoJsonError::NoPolygon);
    }
    Ok(fields)
}

pub fn read_fields(path: &Path) -> Result<Vec<FieldPolygon>, GeoJsonError> {
    parse_fields(&read_text(path)?)
}

fn ring_json(polygon: &Polygon<f64>) -> Value {
    let ring: Vec<[f64; 2]> = polygon.exterior().coords().map(|c| [c.x, c.y]).collect();
    json!([ring])
}

/// Render a map as a FeatureCollection, one feature per cell
///
/// The totals are carried as foreign members next to `features`.
pub fn map_to_geojson(map: &VfmMap) -> Value {
    let features: Vec<Value> = map
        .cells
        .iter()
        .map(|cell| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": ring_json(&cell.polygon),
                },
                "properties": {
                    "humus_mean": cell.humus_mean,
                    "area": cell.area,
                    "intersects": cell.intersects,
                    "amount_fertilization_factor": cell.amount_fertilization_factor,
                    "amount_fertilization_unit": cell.amount_fertilization_unit,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "area_sum": map.area_sum,
        "amount_sum": map.amount_sum,
        "features": features,
    })
}

pub fn write_map(path: &Path, map: &VfmMap) -> Result<(), GeoJsonError> {
    let file = File::create(path).map_err(|source| GeoJsonError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &map_to_geojson(map))?;
    Ok(())
}

/// Read cells back from a map written by [`write_map`]
///
/// Only `humus_mean`, `area` and `intersects` matter for recomputation;
/// missing properties default to no data.
pub fn parse_cells(json: &str) -> Result<Vec<MeshCell>, GeoJsonError> {
    let features = match serde_json::from_str::<Document>(json)? {
        Document::FeatureCollection { features } => features,
        Document::Feature(feature) => vec![feature],
        _ => return Err(GeoJsonError::NoPolygon),
    };

    let cells: Vec<MeshCell> = features
        .into_iter()
        .filter_map(|feature| {
            let polygon = feature.geometry.as_ref()?.polygon()?;
            let properties = feature.properties.unwrap_or_default();

            let mut cell = MeshCell::new(polygon);
            if let Some(area) = property_f64(&properties, "area") {
                cell.area = area;
            }
            cell.humus_mean = property_f64(&properties, "humus_mean").unwrap_or(0.0);
            cell.intersects = properties
                .get("intersects")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            cell.amount_fertilization_factor =
                property_f64(&properties, "amount_fertilization_factor").unwrap_or(0.0);
            cell.amount_fertilization_unit = properties
                .get("amount_fertilization_unit")
                .and_then(Value::as_u64)
                .and_then(|u| u32::try_from(u).ok())
                .unwrap_or(0);
            Some(cell)
        })
        .collect();

    if cells.is_empty() {
        return Err(GeoJsonError::NoPolygon);
    }
    Ok(cells)
}

pub fn read_cells(path: &Path) -> Result<Vec<MeshCell>, GeoJsonError> {
    parse_cells(&read_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApplicationParameters;
    use crate::vfm::update_vfm;

    const FIELD: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [141.35, 43.06]},
                "properties": {}
            },
            {
                "type": "Feature",
                "id": 7,
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [141.3500, 43.0600, 12.5],
                        [141.3512, 43.0600, 12.5],
                        [141.3512, 43.0610, 12.5],
                        [141.3500, 43.0610, 12.5],
                        [141.3500, 43.0600, 12.5]
                    ]]
                },
                "properties": {"id": "field-a", "area": 104.5}
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let fields = parse_fields(FIELD).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id.as_deref(), Some("field-a"));
        assert_eq!(fields[0].area_are(), 104.5);
        assert_eq!(fields[0].polygon().exterior().coords().count(), 5);
    }

    #[test]
    fn test_parse_bare_polygon() {
        let json = r#"{"type": "Polygon", "coordinates": [[[0, 0], [0.001, 0], [0.001, 0.001], [0, 0]]]}"#;
        let fields = parse_fields(json).unwrap();

        assert_eq!(fields.len(), 1);
        assert!(fields[0].id.is_none());
        assert!(fields[0].area_are() > 0.0);
    }

    #[test]
    fn test_feature_id_fallback() {
        let json = r#"{
            "type": "Feature",
            "id": 42,
            "geometry": {"type": "MultiPolygon", "coordinates": [[[[0, 0], [0.001, 0], [0.001, 0.001], [0, 0]]]]},
            "properties": null
        }"#;
        let fields = parse_fields(json).unwrap();
        assert_eq!(fields[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn test_no_polygon() {
        let json = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(parse_fields(json), Err(GeoJsonError::NoPolygon)));
    }

    #[test]
    fn test_degenerate_polygon_is_geometry_error() {
        let json = r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 1], [0, 0]]]}"#;
        assert!(matches!(parse_fields(json), Err(GeoJsonError::Geometry(_))));
    }

    #[test]
    fn test_map_survives_a_write_and_read() {
        let field = &parse_fields(FIELD).unwrap()[0];
        let mut a = MeshCell::new(field.polygon().clone());
        a.humus_mean = 31.5;
        a.intersects = true;
        let mut b = a.clone();
        b.humus_mean = 0.0;
        b.intersects = false;

        let map = update_vfm(&[a, b], &ApplicationParameters::new(100.0, 20.0));
        let text = map_to_geojson(&map).to_string();
        let cells = parse_cells(&text).unwrap();

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].humus_mean, 0.0);
        assert!(!cells[0].intersects);
        assert_eq!(cells[1].humus_mean, 31.5);
        assert_eq!(cells[1].amount_fertilization_unit, map.cells[1].amount_fertilization_unit);
        assert_eq!(cells[1].area, map.cells[1].area);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["amount_sum"].as_f64(), Some(map.amount_sum));
    }
}
