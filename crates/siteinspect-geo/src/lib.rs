//! Site Inspect Geo - Geometry kernel for site boundaries
//!
//! This crate holds the pure geometry used by the workflow: geodesic measurement,
//! collinear simplification, planar transforms, terrain bounds, ring validation
//! and the local inward-offset used to derive buildable areas.

pub mod bounds;
pub mod measure;
pub mod models;
pub mod offset;
pub mod transform;
pub mod validation;

pub use bounds::{terrain_bounds, DEFAULT_TERRAIN_BUFFER_M};
pub use measure::{
    centroid, distance_meters, edges_of, merge_collinear, merge_collinear_ring, nearest_edge,
    point_in_polygon, point_segment_distance, polygon_area_m2, polygon_perimeter_m,
    DEFAULT_COLLINEAR_TOLERANCE,
};
pub use offset::offset_ring_inward;
pub use transform::{rotate_around, scale_around, translate};
pub use validation::{ensure_valid_ring, validate_ring, RingCheck, ValidationResult};
