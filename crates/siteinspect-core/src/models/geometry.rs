//! Canonical geometry types used across all siteinspect crates.
//!
//! Coordinates are WGS84 degrees in `(longitude, latitude)` order and serialize as
//! GeoJSON positions (`[lng, lat]`), so wire payloads and persisted snapshots share
//! one representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

impl Point {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Whether both components are finite and inside the longitude/latitude ranges
    pub fn is_in_range(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Component-wise comparison with an absolute tolerance in degrees
    pub fn approx_eq(&self, other: &Point, epsilon: f64) -> bool {
        (self.lng - other.lng).abs() <= epsilon && (self.lat - other.lat).abs() <= epsilon
    }

    /// Planar midpoint in degree space
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.lng + other.lng) / 2.0, (self.lat + other.lat) / 2.0)
    }
}

impl From<[f64; 2]> for Point {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self::new(lng, lat)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.lng, p.lat]
    }
}

impl From<(f64, f64)> for Point {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self::new(lng, lat)
    }
}

/// Ordered polygon boundary.
///
/// A ring is "open" while it is being drawn and "closed" (first == last) once
/// finalized. The vertex accessors always work on the de-duplicated form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(Vec<Point>);

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// All stored points, including an explicit closing point if present
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First and last point are coordinate-equal
    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => self.0.len() > 1 && first == last,
            _ => false,
        }
    }

    /// Vertices without the duplicated closing point
    pub fn vertices(&self) -> &[Point] {
        if self.is_closed() {
            &self.0[..self.0.len() - 1]
        } else {
            &self.0
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Number of coordinate-distinct vertices
    pub fn distinct_count(&self) -> usize {
        let vertices = self.vertices();
        vertices
            .iter()
            .enumerate()
            .filter(|(i, p)| !vertices[..*i].contains(p))
            .count()
    }

    /// Return the closed form of this ring (first point appended if needed)
    pub fn closed(&self) -> Ring {
        let mut points = self.0.clone();
        if !self.is_closed() {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        Ring(points)
    }

    /// Closed ring as GeoJSON position arrays
    pub fn to_positions(&self) -> Vec<Vec<f64>> {
        self.closed().0.iter().map(|p| vec![p.lng, p.lat]).collect()
    }
}

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

impl From<Vec<[f64; 2]>> for Ring {
    fn from(coords: Vec<[f64; 2]>) -> Self {
        Self(coords.into_iter().map(Point::from).collect())
    }
}

/// A ring segment with a stable index.
///
/// Edge `i` joins vertex `i` to vertex `(i + 1) mod n` of the de-duplicated ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub index: usize,
    pub start: Point,
    pub end: Point,
    pub midpoint: Point,
}

impl Edge {
    pub fn new(index: usize, start: Point, end: Point) -> Self {
        Self { index, start, end, midpoint: start.midpoint(&end) }
    }
}

/// Buffered bounding box used to frame terrain around a site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainBounds {
    pub southwest: Point,
    pub northeast: Point,
    pub center: Point,
    /// Width in degrees of longitude
    pub width: f64,
    /// Height in degrees of latitude
    pub height: f64,
}

/// Extract a point list from loosely-shaped JSON coordinates.
///
/// Accepts `[[lng, lat], ...]`, a polygon-style `[[[lng, lat], ...]]` (first ring),
/// `[{lng, lat}, ...]` and `[{longitude, latitude}, ...]`. Entries that cannot be read
/// as a pair of numbers are skipped.
pub fn extract_points(value: &Value) -> Vec<Point> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    // Polygon nesting: first element is itself an array of positions
    if let Some(Value::Array(first)) = items.first() {
        if first.first().is_some_and(|v| v.is_array() || v.is_object()) {
            return extract_points(&items[0]);
        }
    }

    items.iter().filter_map(point_from_value).collect()
}

fn point_from_value(value: &Value) -> Option<Point> {
    match value {
        Value::Array(pair) if pair.len() >= 2 => {
            Some(Point::new(number(&pair[0])?, number(&pair[1])?))
        }
        Value::Object(map) => {
            let lng = map.get("lng").or_else(|| map.get("longitude")).or_else(|| map.get("lon"));
            let lat = map.get("lat").or_else(|| map.get("latitude"));
            Some(Point::new(number(lng?)?, number(lat?)?))
        }
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}
