//! Inward offset of a polygon with a distinct distance per edge.
//!
//! Each edge is shifted toward the interior in a local metric projection and
//! consecutive offset lines are intersected to find the new vertices. The
//! result is rejected when the shrunken polygon collapses or turns inside out.

use geo::Coord;
use tracing::debug;

use crate::models::{LocalProjection, Point, Ring};

/// Smallest area, in square meters, still treated as a polygon
const MIN_AREA_M2: f64 = 1e-6;

/// Threshold below which two offset lines are considered parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Relative slack for rounding when the offset is zero
const AREA_GROWTH_TOLERANCE: f64 = 1e-9;

/// Edges shorter than this, in meters, are repeated vertices
const MIN_EDGE_M: f64 = 1e-3;

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

fn signed_area(coords: &[Coord<f64>]) -> f64 {
    let n = coords.len();
    (0..n)
        .map(|i| cross(coords[i], coords[(i + 1) % n]))
        .sum::<f64>()
        / 2.0
}

/// Offset line of one edge: a point on it and its direction
struct OffsetLine {
    origin: Coord<f64>,
    direction: Coord<f64>,
}

fn intersect(a: &OffsetLine, b: &OffsetLine) -> Option<Coord<f64>> {
    let denom = cross(a.direction, b.direction);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = cross(b.origin - a.origin, b.direction) / denom;
    Some(a.origin + a.direction * t)
}

/// Shrink `ring` by `distances[i]` meters along edge `i`.
///
/// Edge `i` runs from vertex `i` to vertex `i + 1`. Zero-length edges from
/// repeated vertices are skipped, so `distances` still lines up with the
/// original edge indices. Returns a closed ring, or `None` when the input is
/// degenerate or the offset consumes the polygon.
pub fn offset_ring_inward(ring: &Ring, distances: &[f64]) -> Option<Vec<Point>> {
    let vertices = ring.vertices();
    if vertices.len() < 3 || distances.len() != vertices.len() {
        return None;
    }

    let projection = LocalProjection::around(vertices)?;
    let projected: Vec<Coord<f64>> = vertices.iter().map(|p| projection.forward(p)).collect();

    // A repeated vertex i starts a zero-length edge; vertex i + 1 takes its place
    let (coords, kept_distances): (Vec<Coord<f64>>, Vec<f64>) = (0..projected.len())
        .filter(|&i| {
            let direction = projected[(i + 1) % projected.len()] - projected[i];
            dot(direction, direction).sqrt() >= MIN_EDGE_M
        })
        .map(|i| (projected[i], distances[i]))
        .unzip();
    let n = coords.len();
    if n < 3 {
        return None;
    }
    if n < projected.len() {
        debug!(skipped = projected.len() - n, "Skipping zero-length edges");
    }

    let original_area = signed_area(&coords);
    if original_area.abs() < MIN_AREA_M2 {
        return None;
    }
    let counter_clockwise = original_area > 0.0;

    let mut lines = Vec::with_capacity(n);
    for i in 0..n {
        let direction = coords[(i + 1) % n] - coords[i];
        let unit = direction / dot(direction, direction).sqrt();
        let inward = if counter_clockwise {
            Coord { x: -unit.y, y: unit.x }
        } else {
            Coord { x: unit.y, y: -unit.x }
        };
        let distance = kept_distances[i].max(0.0);
        lines.push(OffsetLine { origin: coords[i] + inward * distance, direction });
    }

    let mut shrunk = Vec::with_capacity(n);
    for i in 0..n {
        let previous = &lines[(i + n - 1) % n];
        let current = &lines[i];
        // Parallel neighbours share the vertex's offset along the current edge
        shrunk.push(intersect(previous, current).unwrap_or(current.origin));
    }

    let area = signed_area(&shrunk);
    if area.abs() < MIN_AREA_M2 || area.signum() != original_area.signum() {
        debug!(area, original_area, "Offset polygon collapsed or flipped");
        return None;
    }
    if area.abs() > original_area.abs() * (1.0 + AREA_GROWTH_TOLERANCE) {
        return None;
    }

    for i in 0..n {
        let new_direction = shrunk[(i + 1) % n] - shrunk[i];
        if dot(new_direction, lines[i].direction) <= 0.0 {
            debug!(edge = i, "Offset edge reversed direction");
            return None;
        }
    }

    let mut points: Vec<Point> = shrunk.into_iter().map(|c| projection.inverse(c)).collect();
    points.push(points[0]);
    Some(points)
}
