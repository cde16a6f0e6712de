//! GeoJSON feature collections for the map widget.
//!
//! Polygons are always emitted with a closed exterior ring.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde_json::Value;
use siteinspect_core::models::{
    area_text, BoundaryPolygon, BuildableArea, EdgeSelection, Footprint, Point, Ring,
};

use crate::drawing::{DimensionLabel, DrawPreview};

fn position(point: &Point) -> Vec<f64> {
    vec![point.lng, point.lat]
}

fn polygon_geometry(ring: &Ring) -> Geometry {
    let exterior = ring.closed().points().iter().map(position).collect();
    Geometry::new(GeoValue::Polygon(vec![exterior]))
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        geometry: Some(geometry),
        properties: Some(properties),
        id: None,
        bbox: None,
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { features, bbox: None, foreign_members: None }
}

fn properties<const N: usize>(entries: [(&str, Value); N]) -> JsonObject {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn label_feature(label: &DimensionLabel) -> Feature {
    feature(
        Geometry::new(GeoValue::Point(position(&label.position))),
        properties([
            ("layer", "dimension_label".into()),
            ("text", label.text.clone().into()),
            ("distance_m", label.distance_m.into()),
            ("kind", serde_json::to_value(label.kind).unwrap_or(Value::Null)),
        ]),
    )
}

/// Features for an in-progress drawing: live line, fill preview, vertices, labels
pub fn preview_layer(points: &[Point], preview: &DrawPreview) -> FeatureCollection {
    let mut features = Vec::new();

    if let Some((start, end)) = &preview.live_segment {
        features.push(feature(
            Geometry::new(GeoValue::LineString(vec![position(start), position(end)])),
            properties([("layer", "preview_line".into())]),
        ));
    }
    if let Some(polygon) = &preview.polygon {
        features.push(feature(polygon_geometry(polygon), properties([("layer", "preview_polygon".into())])));
    }
    for (index, point) in points.iter().enumerate() {
        features.push(feature(
            Geometry::new(GeoValue::Point(position(point))),
            properties([("layer", "vertex".into()), ("index", index.into())]),
        ));
    }
    features.extend(preview.labels.iter().map(label_feature));

    collection(features)
}

/// Boundary fill plus one line feature per edge, tagged with its selection role
pub fn boundary_layer(boundary: &BoundaryPolygon, selection: &EdgeSelection) -> FeatureCollection {
    let mut features = vec![feature(
        polygon_geometry(&boundary.ring),
        properties([
            ("layer", "site_boundary".into()),
            ("area_m2", boundary.area_m2.into()),
            ("area_text", area_text(boundary.area_m2).into()),
            ("perimeter_m", boundary.perimeter_m.into()),
            ("locked", boundary.locked.into()),
            ("feature_id", boundary.feature_id.map(|id| id.to_string()).into()),
        ]),
    )];

    features.extend(boundary.edges.iter().map(|edge| {
        feature(
            Geometry::new(GeoValue::LineString(vec![position(&edge.start), position(&edge.end)])),
            properties([
                ("layer", "edge".into()),
                ("index", edge.index.into()),
                ("role", selection.role_of(edge.index).as_str().into()),
            ]),
        )
    }));

    collection(features)
}

pub fn buildable_layer(area: &BuildableArea) -> FeatureCollection {
    collection(vec![feature(
        polygon_geometry(&area.ring),
        properties([
            ("layer", "buildable_area".into()),
            ("area_m2", area.area_m2.into()),
            ("area_text", area_text(area.area_m2).into()),
            ("coverage_ratio", area.coverage_ratio.into()),
            ("calculation_method", area.calculation_method.clone().into()),
            ("preview", area.preview.into()),
        ]),
    )])
}

/// Footprint fill followed by its dimension labels
pub fn footprint_layer(footprint: &Footprint, labels: &[DimensionLabel]) -> FeatureCollection {
    let mut features = vec![feature(
        polygon_geometry(&footprint.ring),
        properties([
            ("layer", "footprint".into()),
            ("area_m2", footprint.area_m2.into()),
            ("locked", footprint.locked.into()),
            ("rotation_radians", footprint.transform.rotation_radians.into()),
            ("scale_factor", footprint.transform.scale_factor.into()),
        ]),
    )];
    features.extend(labels.iter().map(label_feature));
    collection(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::PolygonBuilder;
    use siteinspect_geo::edges_of;

    fn square() -> Ring {
        Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0]])
    }

    fn exterior(feature: &Feature) -> Vec<Vec<f64>> {
        match &feature.geometry.as_ref().unwrap().value {
            GeoValue::Polygon(rings) => rings[0].clone(),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_polygons_are_closed() {
        let area = BuildableArea {
            ring: square(),
            area_m2: 12_000.0,
            coverage_ratio: 1.0,
            calculation_method: "test".to_string(),
            preview: true,
        };
        let layer = buildable_layer(&area);
        let ring = exterior(&layer.features[0]);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(layer.features[0].property("area_text").unwrap(), "1.20 hectares");
    }

    #[test]
    fn test_boundary_edges_carry_roles() {
        let ring = square().closed();
        let boundary = BoundaryPolygon {
            edges: edges_of(&ring),
            ring,
            area_m2: 12_300.0,
            perimeter_m: 444.8,
            locked: false,
            feature_id: None,
        };
        let selection = EdgeSelection { front: Some(boundary.edges[1]), back: Some(boundary.edges[3]) };
        let layer = boundary_layer(&boundary, &selection);

        assert_eq!(layer.features.len(), 5);
        let roles: Vec<&str> =
            layer.features[1..].iter().map(|f| f.property("role").unwrap().as_str().unwrap()).collect();
        assert_eq!(roles, vec!["side", "front", "side", "back"]);
    }

    #[test]
    fn test_preview_layer() {
        let mut builder = PolygonBuilder::new();
        builder.start();
        for point in square().points() {
            builder.add_point(*point).unwrap();
        }
        let preview = builder.preview_at(Point::new(0.0005, -0.0005));
        let layer = preview_layer(builder.points(), &preview);

        let layers: Vec<&str> =
            layer.features.iter().map(|f| f.property("layer").unwrap().as_str().unwrap()).collect();
        assert_eq!(layers[0], "preview_line");
        assert_eq!(layers[1], "preview_polygon");
        assert_eq!(layers.iter().filter(|l| **l == "vertex").count(), 4);
        assert_eq!(layers.iter().filter(|l| **l == "dimension_label").count(), 5);
        assert_eq!(exterior(&layer.features[1]).first(), exterior(&layer.features[1]).last());
    }
}
