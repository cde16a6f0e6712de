//! Reading and writing persisted project snapshots.
//!
//! Snapshot `data` arrives either as parsed JSON or as a string. Strings that are
//! not valid JSON get one more attempt with single quotes replaced by double
//! quotes before the snapshot is rejected.

use chrono::Utc;
use serde_json::{json, Value};
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{
    extract_points, parse_distance, BoundaryPolygon, BuildableArea, EdgeSelection,
    EdgeSelectionRecord, Footprint, RawSnapshot, Ring, SetbackSpec, SnapshotKind,
    TransformRecord,
};
use tracing::debug;
use uuid::Uuid;

/// Setbacks assumed for buildable-area snapshots that carry none
pub const DEFAULT_SNAPSHOT_SETBACKS: SetbackSpec = SetbackSpec { front: 4.5, back: 3.5, side: 1.5 };

/// Boundary as stored in a `site_boundary` snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SiteBoundarySnapshot {
    pub ring: Ring,
    pub feature_id: Option<Uuid>,
    pub locked: bool,
}

/// Content of a `buildable_area` snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct BuildableAreaSnapshot {
    /// Site boundary the buildable area was computed from
    pub site_ring: Ring,
    pub buildable: Option<BuildableArea>,
    pub setbacks: SetbackSpec,
    pub selected_edges: Vec<usize>,
}

/// Content of a `structure_placement` snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSnapshot {
    pub ring: Ring,
    pub transform: TransformRecord,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotContent {
    SiteBoundary(SiteBoundarySnapshot),
    BuildableArea(BuildableAreaSnapshot),
    StructurePlacement(StructureSnapshot),
}

impl SnapshotContent {
    /// Site boundary ring, from whichever shape carries one
    pub fn site_ring(&self) -> Option<&Ring> {
        match self {
            SnapshotContent::SiteBoundary(s) => Some(&s.ring),
            SnapshotContent::BuildableArea(s) => Some(&s.site_ring),
            SnapshotContent::StructurePlacement(_) => None,
        }
    }
}

/// Parse snapshot `data`, tolerating string payloads and single-quoted JSON
pub fn parse_payload(data: &Value) -> Result<Value> {
    let Value::String(text) = data else {
        return Ok(data.clone());
    };

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!(error = %first, "Snapshot is not valid JSON, retrying with double quotes");
            serde_json::from_str(&text.replace('\'', "\"")).map_err(|e| SiteError::SnapshotParse {
                reason: format!("{} (after quote fallback: {})", first, e),
            })
        }
    }
}

/// Interpret a raw snapshot according to its kind
pub fn parse_snapshot(raw: &RawSnapshot) -> Result<SnapshotContent> {
    let kind: SnapshotKind = raw.kind.parse()?;
    let data = parse_payload(&raw.data)?;

    match kind {
        SnapshotKind::SiteBoundary => parse_site_boundary(&data).map(SnapshotContent::SiteBoundary),
        SnapshotKind::BuildableArea => parse_buildable_area(&data).map(SnapshotContent::BuildableArea),
        SnapshotKind::StructurePlacement => parse_structure(&data).map(SnapshotContent::StructurePlacement),
    }
}

/// Read a ring from the first of `keys` holding at least 3 usable points
fn ring_from(data: &Value, keys: &[&str]) -> Option<Ring> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .map(|value| match value.get("coordinates") {
            // GeoJSON geometry object
            Some(coordinates) => extract_points(coordinates),
            None => extract_points(value),
        })
        .find(|points| points.len() >= 3)
        .map(|points| Ring::new(points).closed())
}

fn number(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_site_boundary(data: &Value) -> Result<SiteBoundarySnapshot> {
    let ring = ring_from(data, &["coordinates", "boundary", "geometry"])
        .or_else(|| {
            // a bare coordinate array
            let points = extract_points(data);
            (points.len() >= 3).then(|| Ring::new(points).closed())
        })
        .ok_or(SiteError::NoCoordinates)?;

    let feature_id = data
        .get("feature_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok());
    let locked = data.get("locked").and_then(Value::as_bool).unwrap_or(false);

    Ok(SiteBoundarySnapshot { ring, feature_id, locked })
}

fn parse_setbacks(data: &Value) -> SetbackSpec {
    let Some(setbacks) = data.get("setbacks").or_else(|| data.get("requirements")) else {
        return DEFAULT_SNAPSHOT_SETBACKS;
    };

    let field = |keys: &[&str], default: f64| {
        keys.iter()
            .find_map(|key| setbacks.get(*key))
            .map(|value| match value {
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                Value::String(s) => parse_distance(Some(s)),
                _ => 0.0,
            })
            .unwrap_or(default)
    };

    SetbackSpec::new(
        field(&["front", "front_setback"], DEFAULT_SNAPSHOT_SETBACKS.front),
        field(&["back", "rear", "rear_setback"], DEFAULT_SNAPSHOT_SETBACKS.back),
        field(&["side", "side_setback"], DEFAULT_SNAPSHOT_SETBACKS.side),
    )
}

fn parse_buildable_area(data: &Value) -> Result<BuildableAreaSnapshot> {
    let site_ring =
        ring_from(data, &["site_coords", "original_coords"]).ok_or(SiteError::NoCoordinates)?;

    let buildable = ring_from(data, &["buildable_coords"]).map(|ring| BuildableArea {
        ring,
        area_m2: number(data, "buildable_area_m2"),
        coverage_ratio: number(data, "coverage_ratio"),
        calculation_method: data
            .get("calculation_method")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        preview: false,
    });

    let selected_edges = data
        .get("edge_selection")
        .cloned()
        .and_then(|value| serde_json::from_value::<EdgeSelectionRecord>(value).ok())
        .map(|record| record.selected_edges)
        .unwrap_or_default();

    Ok(BuildableAreaSnapshot { site_ring, buildable, setbacks: parse_setbacks(data), selected_edges })
}

fn parse_structure(data: &Value) -> Result<StructureSnapshot> {
    let ring = ring_from(data, &["coordinates", "boundaries", "geometry"])
        .ok_or(SiteError::NoCoordinates)?;
    let transform = data
        .get("transform")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    let locked = data.get("locked").and_then(Value::as_bool).unwrap_or(false);

    Ok(StructureSnapshot { ring, transform, locked })
}

/// Snapshot data for a confirmed boundary
pub fn boundary_payload(boundary: &BoundaryPolygon) -> Value {
    json!({
        "coordinates": boundary.ring,
        "area_m2": boundary.area_m2,
        "perimeter_m": boundary.perimeter_m,
        "feature_id": boundary.feature_id,
        "locked": boundary.locked,
    })
}

/// Snapshot data for a confirmed buildable area, including the edge selection
pub fn buildable_payload(
    boundary: &BoundaryPolygon,
    area: &BuildableArea,
    setbacks: &SetbackSpec,
    selection: &EdgeSelection,
) -> Value {
    let record = EdgeSelectionRecord { selected_edges: selection.indices(), timestamp: Some(Utc::now()) };
    json!({
        "site_coords": boundary.ring,
        "buildable_coords": area.ring,
        "buildable_area_m2": area.area_m2,
        "site_area_m2": boundary.area_m2,
        "coverage_ratio": area.coverage_ratio,
        "calculation_method": area.calculation_method,
        "setbacks": {
            "front": setbacks.front,
            "rear": setbacks.back,
            "side": setbacks.side,
        },
        "edge_selection": record,
    })
}

/// Snapshot data for a structure footprint
pub fn footprint_payload(footprint: &Footprint) -> Value {
    json!({
        "coordinates": footprint.ring,
        "area_m2": footprint.area_m2,
        "transform": footprint.transform,
        "locked": footprint.locked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteinspect_core::models::Point;

    fn raw(kind: SnapshotKind, data: Value) -> RawSnapshot {
        RawSnapshot::new(kind, data)
    }

    #[test]
    fn test_parse_parsed_site_boundary() {
        let snapshot = raw(
            SnapshotKind::SiteBoundary,
            json!({"coordinates": [[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0]]}),
        );
        let SnapshotContent::SiteBoundary(boundary) = parse_snapshot(&snapshot).unwrap() else {
            panic!("expected site boundary");
        };
        assert!(boundary.ring.is_closed());
        assert_eq!(boundary.ring.vertex_count(), 4);
        assert!(!boundary.locked);
    }

    #[test]
    fn test_parse_single_quoted_string() {
        let text = "{'coordinates': [[0, 0], [0, 0.001], [0.001, 0.001], [0, 0]]}";
        let snapshot = raw(SnapshotKind::SiteBoundary, Value::String(text.to_string()));

        let content = parse_snapshot(&snapshot).unwrap();
        assert_eq!(content.site_ring().unwrap().vertex_count(), 3);
    }

    #[test]
    fn test_unparseable_string() {
        let snapshot = raw(SnapshotKind::SiteBoundary, Value::String("{not json".to_string()));
        assert!(matches!(parse_snapshot(&snapshot), Err(SiteError::SnapshotParse { .. })));
    }

    #[test]
    fn test_no_coordinates() {
        let snapshot = raw(SnapshotKind::SiteBoundary, json!({"coordinates": [[0, 0]]}));
        assert!(matches!(parse_snapshot(&snapshot), Err(SiteError::NoCoordinates)));
    }

    #[test]
    fn test_geojson_geometry_and_objects() {
        let snapshot = raw(
            SnapshotKind::SiteBoundary,
            json!({"geometry": {"type": "Polygon", "coordinates": [[
                {"lat": 0.0, "lng": 0.0}, {"latitude": 1.0, "longitude": 0.0}, {"lat": 1.0, "lng": 1.0}
            ]]}}),
        );
        let content = parse_snapshot(&snapshot).unwrap();
        assert_eq!(content.site_ring().unwrap().points()[1], Point::new(0.0, 1.0));
    }

    #[test]
    fn test_buildable_snapshot_reconstructs_site() {
        let snapshot = raw(
            SnapshotKind::BuildableArea,
            json!({
                "original_coords": [[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0]],
                "buildable_coords": [[[0.0001, 0.0001], [0.0001, 0.0009], [0.0009, 0.0009], [0.0009, 0.0001]]],
                "buildable_area_m2": 7900.0,
                "coverage_ratio": 0.64,
                "edge_selection": {"selectedEdges": [0, 2]},
            }),
        );
        let SnapshotContent::BuildableArea(content) = parse_snapshot(&snapshot).unwrap() else {
            panic!("expected buildable area");
        };
        assert_eq!(content.site_ring.vertex_count(), 4);
        assert_eq!(content.setbacks, DEFAULT_SNAPSHOT_SETBACKS);
        assert_eq!(content.selected_edges, vec![0, 2]);

        let buildable = content.buildable.unwrap();
        assert_eq!(buildable.area_m2, 7900.0);
        assert_eq!(buildable.calculation_method, "unknown");
        assert!(!buildable.preview);
    }

    #[test]
    fn test_partial_setbacks_keep_defaults() {
        let data = json!({"setbacks": {"front": "6", "rear": -2.0}});
        let setbacks = parse_setbacks(&data);
        assert_eq!(setbacks, SetbackSpec::new(6.0, 0.0, 1.5));
    }

    #[test]
    fn test_unknown_kind() {
        let snapshot = RawSnapshot { kind: "terrain".to_string(), data: json!({}), updated_at: None };
        assert!(matches!(parse_snapshot(&snapshot), Err(SiteError::SnapshotParse { .. })));
    }

    #[test]
    fn test_buildable_payload_round_trips() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.0, 0.0]]);
        let boundary = BoundaryPolygon {
            ring: ring.clone(),
            area_m2: 6000.0,
            perimeter_m: 380.0,
            edges: vec![],
            locked: false,
            feature_id: None,
        };
        let area = BuildableArea {
            ring,
            area_m2: 3000.0,
            coverage_ratio: 0.5,
            calculation_method: "offset".to_string(),
            preview: false,
        };
        let setbacks = SetbackSpec::new(5.0, 3.0, 1.0);
        let payload = buildable_payload(&boundary, &area, &setbacks, &EdgeSelection::default());

        let snapshot = raw(SnapshotKind::BuildableArea, Value::String(payload.to_string()));
        let SnapshotContent::BuildableArea(content) = parse_snapshot(&snapshot).unwrap() else {
            panic!("expected buildable area");
        };
        assert_eq!(content.setbacks, setbacks);
        assert_eq!(content.buildable.unwrap().calculation_method, "offset");
    }
}
