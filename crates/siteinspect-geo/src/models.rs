//! Conversions between the canonical site types and `geo` crate types, plus the
//! local tangent-plane projection used for metric planar work.

use geo::{Coord, LineString, Polygon};

// Re-export canonical types from siteinspect-core
pub use siteinspect_core::models::{Edge, Point, Ring, TerrainBounds};

/// Mean Earth radius in meters used by every spherical computation in this crate
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude used for buffer conversions
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

pub fn to_coord(point: &Point) -> Coord<f64> {
    Coord { x: point.lng, y: point.lat }
}

pub fn from_coord(coord: Coord<f64>) -> Point {
    Point::new(coord.x, coord.y)
}

/// Convert a point sequence to a `geo::LineString` without changing closure
pub fn to_line_string(points: &[Point]) -> LineString<f64> {
    LineString::new(points.iter().map(to_coord).collect())
}

pub fn from_line_string(line: &LineString<f64>) -> Vec<Point> {
    line.coords().map(|c| from_coord(*c)).collect()
}

/// Convert a ring to a single-exterior `geo::Polygon`
pub fn to_polygon(ring: &Ring) -> Polygon<f64> {
    // Polygon::new closes the exterior itself
    Polygon::new(to_line_string(ring.vertices()), vec![])
}

/// Equirectangular projection around an origin, in meters.
///
/// Accurate enough for parcel-sized geometry, which is all the planar fallbacks in
/// this crate are used for.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: Point,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: Point) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos() }
    }

    /// Projection centered on the mean of the given points
    pub fn around(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        Some(Self::new(Point::new(lng, lat)))
    }

    pub fn forward(&self, point: &Point) -> Coord<f64> {
        Coord {
            x: (point.lng - self.origin.lng).to_radians() * EARTH_RADIUS_M * self.cos_lat,
            y: (point.lat - self.origin.lat).to_radians() * EARTH_RADIUS_M,
        }
    }

    pub fn inverse(&self, coord: Coord<f64>) -> Point {
        Point::new(
            self.origin.lng + (coord.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            self.origin.lat + (coord.y / EARTH_RADIUS_M).to_degrees(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_conversion_closes_ring() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let polygon = to_polygon(&ring);
        assert_eq!(polygon.exterior().0.len(), 4);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn test_projection_roundtrip() {
        let projection = LocalProjection::new(Point::new(174.7633, -36.8485));
        let point = Point::new(174.7641, -36.8479);
        let back = projection.inverse(projection.forward(&point));
        assert!(point.approx_eq(&back, 1e-12));
    }

    #[test]
    fn test_projection_scale() {
        let projection = LocalProjection::new(Point::new(0.0, 0.0));
        let coord = projection.forward(&Point::new(0.0, 0.001));
        assert!((coord.y - 111.19).abs() < 0.01);
    }
}
