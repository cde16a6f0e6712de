//! Reading boundary rings from files

use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Geometry, Value as GeometryValue};
use siteinspect_core::models::{extract_points, Point, Ring};
use std::fs;
use std::path::Path;

/// Read a boundary ring from a GeoJSON document or a bare coordinate array.
///
/// GeoJSON input uses the first polygon found (outer ring only). Anything else
/// is read as loose JSON coordinates, optionally under a `coordinates` key.
pub fn read_boundary(path: &Path) -> Result<Ring> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundary file {}", path.display()))?;
    parse_boundary(&content).with_context(|| format!("No boundary found in {}", path.display()))
}

pub fn parse_boundary(content: &str) -> Result<Ring> {
    let points = match content.parse::<GeoJson>() {
        Ok(geojson) => points_from_geojson(&geojson),
        Err(_) => {
            let value: serde_json::Value =
                serde_json::from_str(content).context("Boundary file is not valid JSON")?;
            let coords = value.get("coordinates").unwrap_or(&value);
            extract_points(coords)
        }
    };

    if points.is_empty() {
        bail!("Expected a polygon or a list of [lng, lat] coordinates");
    }
    Ok(Ring::new(points))
}

fn points_from_geojson(geojson: &GeoJson) -> Vec<Point> {
    match geojson {
        GeoJson::Geometry(geometry) => points_from_geometry(geometry),
        GeoJson::Feature(feature) => {
            feature.geometry.as_ref().map(points_from_geometry).unwrap_or_default()
        }
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .map(points_from_geometry)
            .find(|points| !points.is_empty())
            .unwrap_or_default(),
    }
}

fn points_from_geometry(geometry: &Geometry) -> Vec<Point> {
    let outer = match &geometry.value {
        GeometryValue::Polygon(rings) => rings.first(),
        GeometryValue::MultiPolygon(polygons) => polygons.first().and_then(|rings| rings.first()),
        GeometryValue::LineString(line) => Some(line),
        _ => None,
    };
    outer
        .map(|positions| {
            positions
                .iter()
                .filter(|position| position.len() >= 2)
                .map(|position| Point::new(position[0], position[1]))
                .collect()
        })
        .unwrap_or_default()
}
