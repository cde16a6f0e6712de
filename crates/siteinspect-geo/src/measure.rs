//! Distance, area, perimeter, edges and point predicates.
//!
//! Every function here is pure and total: degenerate input yields 0, an empty list
//! or `None`, never a panic.

use geo::{Area, GeodesicArea, Polygon};

use crate::models::{to_line_string, to_polygon, Edge, LocalProjection, Point, Ring, EARTH_RADIUS_M};

/// Default tolerance for [`merge_collinear`]: a turn of about 0.0057 degrees.
///
/// The measure is the cross product of the two legs in lng/lat degrees divided by
/// their lengths, so it is dimensionless and does not depend on edge length.
pub const DEFAULT_COLLINEAR_TOLERANCE: f64 = 1e-4;

/// Half of the Earth's surface; a geodesic area above this is a winding artefact
const HALF_EARTH_AREA_M2: f64 = 2.55e14;

/// Great-circle (haversine) distance in meters
pub fn distance_meters(a: &Point, b: &Point) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Unsigned polygon area in square meters.
///
/// Uses the geodesic area on the WGS84 ellipsoid and falls back to a planar shoelace
/// on a local projection when the geodesic result is unusable. Rings with fewer
/// than 3 distinct vertices have area 0.
pub fn polygon_area_m2(ring: &Ring) -> f64 {
    if ring.distinct_count() < 3 {
        return 0.0;
    }

    let mut polygon = to_polygon(ring);
    if polygon.signed_area() < 0.0 {
        // geodesic area expects counter-clockwise exteriors
        let reversed: Vec<Point> = ring.vertices().iter().rev().copied().collect();
        polygon = Polygon::new(to_line_string(&reversed), vec![]);
    }

    let geodesic = polygon.geodesic_area_unsigned();
    if geodesic.is_finite() && geodesic < HALF_EARTH_AREA_M2 {
        return geodesic;
    }

    tracing::debug!(geodesic, "Geodesic area unusable, falling back to planar area");
    planar_area_m2(ring)
}

/// Planar shoelace area on a local equirectangular projection
pub fn planar_area_m2(ring: &Ring) -> f64 {
    let vertices = ring.vertices();
    let Some(projection) = LocalProjection::around(vertices) else {
        return 0.0;
    };
    let projected: Vec<_> = vertices.iter().map(|p| projection.forward(p)).collect();
    Polygon::new(projected.into(), vec![]).unsigned_area()
}

/// Perimeter in meters; the closing segment is counted exactly once
pub fn polygon_perimeter_m(ring: &Ring) -> f64 {
    if ring.distinct_count() < 3 {
        return 0.0;
    }
    edges_of(ring).iter().map(|e| distance_meters(&e.start, &e.end)).sum()
}

/// Edges of a ring, indexed from 0.
///
/// An explicit closing point is removed before indexing, so the edge count equals
/// the vertex count. Rings with fewer than 3 vertices have no edges.
pub fn edges_of(ring: &Ring) -> Vec<Edge> {
    let vertices = ring.vertices();
    let n = vertices.len();
    if n < 3 {
        return Vec::new();
    }
    (0..n).map(|i| Edge::new(i, vertices[i], vertices[(i + 1) % n])).collect()
}

/// Even-odd ray casting point-in-polygon test
pub fn point_in_polygon(point: &Point, ring: &Ring) -> bool {
    let vertices = ring.vertices();
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (pi, pj) = (vertices[i], vertices[j]);
        if (pi.lat > point.lat) != (pj.lat > point.lat)
            && point.lng < (pj.lng - pi.lng) * (point.lat - pi.lat) / (pj.lat - pi.lat) + pi.lng
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Mean of the ring's distinct vertices (the closing duplicate is excluded)
pub fn centroid(ring: &Ring) -> Option<Point> {
    let vertices = ring.vertices();
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    Some(Point::new(
        vertices.iter().map(|p| p.lng).sum::<f64>() / n,
        vertices.iter().map(|p| p.lat).sum::<f64>() / n,
    ))
}

/// Sine of the turn angle at `b` when walking `a -> b -> c`.
///
/// This is the planar cross product of `b - a` and `c - b` in degree units,
/// normalized by both leg lengths. Zero-length legs count as perfectly collinear.
fn turn_measure(a: &Point, b: &Point, c: &Point) -> f64 {
    let (ux, uy) = (b.lng - a.lng, b.lat - a.lat);
    let (vx, vy) = (c.lng - b.lng, c.lat - b.lat);
    let norm = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
    if norm == 0.0 {
        return 0.0;
    }
    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;
    if dot < 0.0 {
        // a reversal is never a straight continuation
        return 1.0;
    }
    (cross / norm).abs()
}

/// Collapse consecutive near-collinear points of an open polyline.
///
/// The first and last points are always kept. A point is dropped when the path
/// turns by less than `tolerance` at it. `tolerance` is the sine of the turn
/// angle (normalized cross product of the two legs), not a distance in degrees:
/// `1e-4` merges turns under about 0.0057 degrees at any edge length.
pub fn merge_collinear(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut merged = vec![points[0]];
    for window in points.windows(2).skip(1) {
        let (current, next) = (window[0], window[1]);
        let prev = merged[merged.len() - 1];
        if turn_measure(&prev, &current, &next) >= tolerance {
            merged.push(current);
        }
    }
    merged.push(points[points.len() - 1]);
    merged
}

/// Cyclic variant of [`merge_collinear`] for a ring; returns a closed ring.
///
/// If merging would leave fewer than 3 vertices the ring is returned unchanged.
pub fn merge_collinear_ring(ring: &Ring, tolerance: f64) -> Ring {
    let vertices = ring.vertices();
    if vertices.len() < 4 {
        return ring.closed();
    }

    let mut open: Vec<Point> = vertices.to_vec();
    open.push(vertices[0]);
    let mut merged = merge_collinear(&open, tolerance);
    merged.pop();

    // the seam vertex is only checked once its neighbours are final
    if merged.len() > 3 {
        let last = merged[merged.len() - 1];
        if turn_measure(&last, &merged[0], &merged[1]) < tolerance {
            merged.remove(0);
        }
    }

    if merged.len() < 3 {
        return ring.closed();
    }
    Ring::new(merged).closed()
}

/// Planar distance in degrees from a point to a segment
pub fn point_segment_distance(point: &Point, start: &Point, end: &Point) -> f64 {
    let (dx, dy) = (end.lng - start.lng, end.lat - start.lat);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((point.lng - start.lng) * dx + (point.lat - start.lat) * dy) / len2).clamp(0.0, 1.0)
    };
    let (px, py) = (start.lng + t * dx, start.lat + t * dy);
    ((point.lng - px).powi(2) + (point.lat - py).powi(2)).sqrt()
}

/// Index of the edge nearest to `point` if it lies within `threshold` degrees
pub fn nearest_edge(edges: &[Edge], point: &Point, threshold: f64) -> Option<usize> {
    edges
        .iter()
        .map(|e| (e.index, point_segment_distance(point, &e.start, &e.end)))
        .filter(|(_, d)| *d <= threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
