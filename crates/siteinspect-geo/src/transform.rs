//! Planar transforms of point sets in degree space.
//!
//! All helpers return new rings; closure is preserved because the closing point is
//! transformed exactly like the first point. The center defaults to the centroid
//! of the ring's distinct vertices.

use geo::{Rotate, Scale, Translate};

use crate::measure::centroid;
use crate::models::{from_line_string, to_coord, to_line_string, Point, Ring};

/// Shift every point by the given degree offsets
pub fn translate(ring: &Ring, d_lng: f64, d_lat: f64) -> Ring {
    let line = to_line_string(ring.points()).translate(d_lng, d_lat);
    Ring::new(from_line_string(&line))
}

/// Rotate counter-clockwise by `radians` around `center` (or the centroid)
pub fn rotate_around(ring: &Ring, center: Option<Point>, radians: f64) -> Ring {
    let Some(center) = center.or_else(|| centroid(ring)) else {
        return ring.clone();
    };
    let line = to_line_string(ring.points())
        .rotate_around_point(radians.to_degrees(), geo::Point::from(to_coord(&center)));
    Ring::new(from_line_string(&line))
}

/// Scale uniformly by `factor` around `center` (or the centroid)
pub fn scale_around(ring: &Ring, center: Option<Point>, factor: f64) -> Ring {
    let Some(center) = center.or_else(|| centroid(ring)) else {
        return ring.clone();
    };
    let line = to_line_string(ring.points()).scale_around_point(factor, factor, to_coord(&center));
    Ring::new(from_line_string(&line))
}
