//! Buffered bounding boxes for framing terrain around a site.

use geo::BoundingRect;

use crate::models::{to_line_string, Point, Ring, TerrainBounds, METERS_PER_DEGREE_LAT};

/// Default buffer around the site, in meters
pub const DEFAULT_TERRAIN_BUFFER_M: f64 = 50.0;

/// Bounding box of `ring` expanded by `buffer_m` meters on every side.
///
/// The latitude buffer is constant; the longitude buffer is widened by
/// `1 / cos(mean latitude)` to account for meridian convergence.
pub fn terrain_bounds(ring: &Ring, buffer_m: f64) -> Option<TerrainBounds> {
    let rect = to_line_string(ring.points()).bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());

    let mean_lat = ((min.y + max.y) / 2.0).to_radians();
    let lat_buffer = buffer_m / METERS_PER_DEGREE_LAT;
    let lng_buffer = buffer_m / (METERS_PER_DEGREE_LAT * mean_lat.cos());

    Some(TerrainBounds {
        southwest: Point::new(min.x - lng_buffer, min.y - lat_buffer),
        northeast: Point::new(max.x + lng_buffer, max.y + lat_buffer),
        center: Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
        width: max.x - min.x + 2.0 * lng_buffer,
        height: max.y - min.y + 2.0 * lat_buffer,
    })
}
