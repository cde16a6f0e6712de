//! The confirmed site boundary and its derived measurements.

use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{BoundaryPolygon, RawSnapshot, Ring, TerrainBounds};
use siteinspect_geo::{
    edges_of, ensure_valid_ring, polygon_area_m2, polygon_perimeter_m, terrain_bounds, RingCheck,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::snapshot::{parse_snapshot, SnapshotContent};

/// Build a boundary polygon from a ring, computing area, perimeter and edges.
///
/// Fails with `InvalidGeometry` for out-of-range coordinates or fewer than 3
/// distinct points. A zero-area ring is accepted with a warning.
pub fn build_boundary(ring: Ring, feature_id: Option<Uuid>) -> Result<BoundaryPolygon> {
    let ring = ring.closed();
    ensure_valid_ring(&ring, RingCheck::Closed)?;

    let area_m2 = polygon_area_m2(&ring);
    if area_m2 <= 0.0 {
        warn!(points = ring.vertex_count(), "Boundary has zero area");
    }

    Ok(BoundaryPolygon {
        area_m2,
        perimeter_m: polygon_perimeter_m(&ring),
        edges: edges_of(&ring),
        locked: false,
        feature_id: feature_id.or_else(|| Some(Uuid::new_v4())),
        ring,
    })
}

/// Owner of the single active site boundary
#[derive(Debug, Clone, Default)]
pub struct BoundaryModel {
    boundary: Option<BoundaryPolygon>,
}

impl BoundaryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boundary(&self) -> Option<&BoundaryPolygon> {
        self.boundary.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.boundary.as_ref().is_some_and(|b| b.locked)
    }

    /// Replace the boundary with one built from `ring`
    pub fn create(&mut self, ring: Ring) -> Result<&BoundaryPolygon> {
        let boundary = build_boundary(ring, None)?;
        info!(
            area_m2 = boundary.area_m2,
            perimeter_m = boundary.perimeter_m,
            edges = boundary.edges.len(),
            "Boundary created"
        );
        Ok(self.boundary.insert(boundary))
    }

    /// Restore the boundary from a `site_boundary` or `buildable_area` snapshot.
    ///
    /// The stored feature id and lock state are kept when present.
    pub fn load_from_snapshot(&mut self, raw: &RawSnapshot) -> Result<&BoundaryPolygon> {
        let (ring, feature_id, locked) = match parse_snapshot(raw)? {
            SnapshotContent::SiteBoundary(s) => (s.ring, s.feature_id, s.locked),
            SnapshotContent::BuildableArea(s) => (s.site_ring, None, false),
            SnapshotContent::StructurePlacement(_) => return Err(SiteError::NoCoordinates),
        };

        let mut boundary = build_boundary(ring, feature_id)?;
        boundary.locked = locked;
        info!(kind = %raw.kind, area_m2 = boundary.area_m2, "Boundary loaded from snapshot");
        Ok(self.boundary.insert(boundary))
    }

    /// Drop the boundary, returning it if there was one
    pub fn clear(&mut self) -> Option<BoundaryPolygon> {
        self.boundary.take()
    }

    /// Flip the lock flag; geometry is never touched
    pub fn toggle_lock(&mut self) -> Result<bool> {
        let boundary = self.boundary.as_mut().ok_or(SiteError::NoBoundary)?;
        boundary.locked = !boundary.locked;
        Ok(boundary.locked)
    }

    /// Buffered bounding box of the boundary
    pub fn terrain_bounds(&self, buffer_m: f64) -> Option<TerrainBounds> {
        self.boundary.as_ref().and_then(|b| terrain_bounds(&b.ring, buffer_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteinspect_core::models::SnapshotKind;

    fn square() -> Ring {
        Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0], [0.0, 0.0]])
    }

    #[test]
    fn test_create_measures_boundary() {
        let mut model = BoundaryModel::new();
        let boundary = model.create(square()).unwrap();

        assert!(boundary.area_m2 > 12_000.0 && boundary.area_m2 < 12_500.0);
        assert!(boundary.perimeter_m > 440.0 && boundary.perimeter_m < 450.0);
        assert_eq!(boundary.edges.len(), 4);
        assert!(!boundary.locked);
        assert!(boundary.feature_id.is_some());
    }

    #[test]
    fn test_create_closes_open_ring() {
        let mut model = BoundaryModel::new();
        let open = Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.001, 0.001]]);
        let boundary = model.create(open).unwrap();
        assert!(boundary.ring.is_closed());
        assert_eq!(boundary.edges.len(), 3);
    }

    #[test]
    fn test_create_rejects_two_distinct_points() {
        let mut model = BoundaryModel::new();
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.0, 0.0]]);
        assert!(matches!(model.create(ring), Err(SiteError::InvalidGeometry { .. })));
        assert!(model.boundary().is_none());
    }

    #[test]
    fn test_zero_area_is_tolerated() {
        let mut model = BoundaryModel::new();
        let line = Ring::from(vec![[0.0, 0.0], [0.0, 0.001], [0.0, 0.002]]);
        let boundary = model.create(line).unwrap();
        assert!(boundary.area_m2.abs() < 1e-6);
    }

    #[test]
    fn test_toggle_lock_keeps_geometry() {
        let mut model = BoundaryModel::new();
        assert!(matches!(model.toggle_lock(), Err(SiteError::NoBoundary)));

        let before = model.create(square()).unwrap().clone();
        assert!(model.toggle_lock().unwrap());
        assert!(model.is_locked());
        assert!(!model.toggle_lock().unwrap());
        assert_eq!(model.boundary().unwrap().ring, before.ring);
    }

    #[test]
    fn test_load_preserves_feature_id_and_lock() {
        let id = Uuid::new_v4();
        let raw = RawSnapshot::new(
            SnapshotKind::SiteBoundary,
            json!({
                "coordinates": [[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0]],
                "feature_id": id.to_string(),
                "locked": true,
            }),
        );

        let mut model = BoundaryModel::new();
        let boundary = model.load_from_snapshot(&raw).unwrap();
        assert_eq!(boundary.feature_id, Some(id));
        assert!(boundary.locked);
        assert_eq!(boundary.edges.len(), 4);
    }

    #[test]
    fn test_load_from_buildable_snapshot() {
        let raw = RawSnapshot::new(
            SnapshotKind::BuildableArea,
            json!({"site_coords": [[0.0, 0.0], [0.0, 0.001], [0.001, 0.001]]}),
        );
        let mut model = BoundaryModel::new();
        assert_eq!(model.load_from_snapshot(&raw).unwrap().edges.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut model = BoundaryModel::new();
        model.create(square()).unwrap();
        assert!(model.clear().is_some());
        assert!(model.boundary().is_none());
        assert!(model.terrain_bounds(50.0).is_none());
    }
}
