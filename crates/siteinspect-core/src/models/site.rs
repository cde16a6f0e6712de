//! Site-level entities: boundary, buildable area, footprint and workflow stage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{Edge, Ring};

/// The finalized site boundary with cached measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPolygon {
    /// Closed ring
    pub ring: Ring,

    /// Geodesic area in square meters
    pub area_m2: f64,

    /// Perimeter in meters
    pub perimeter_m: f64,

    /// Edges derived from `ring`, regenerated whenever the ring changes
    pub edges: Vec<Edge>,

    pub locked: bool,

    /// External feature identifier used to correlate persisted snapshots
    pub feature_id: Option<Uuid>,
}

/// Buildable area left after setbacks are applied to the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildableArea {
    pub ring: Ring,
    pub area_m2: f64,
    pub coverage_ratio: f64,
    pub calculation_method: String,

    /// Display-only result that has not been confirmed or persisted
    pub preview: bool,
}

/// Accumulated manual transforms applied to a footprint.
///
/// Transforms are baked into the footprint ring; this record is bookkeeping for
/// persistence only and is never re-applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub translation_lng: f64,
    pub translation_lat: f64,

    /// Accumulated rotation in radians, kept in `[0, 2π)`
    pub rotation_radians: f64,

    /// Accumulated multiplicative scale
    pub scale_factor: f64,
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self { translation_lng: 0.0, translation_lat: 0.0, rotation_radians: 0.0, scale_factor: 1.0 }
    }
}

impl TransformRecord {
    pub fn add_translation(&mut self, d_lng: f64, d_lat: f64) {
        self.translation_lng += d_lng;
        self.translation_lat += d_lat;
    }

    pub fn add_rotation(&mut self, radians: f64) {
        self.rotation_radians = (self.rotation_radians + radians).rem_euclid(std::f64::consts::TAU);
    }

    pub fn add_scale(&mut self, factor: f64) {
        self.scale_factor *= factor;
    }
}

/// A structure footprint placed inside the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub ring: Ring,
    pub area_m2: f64,
    pub transform: TransformRecord,
    pub locked: bool,
}

/// Workflow stage of a site inspection.
///
/// Ordering follows the order in which stages are completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    BoundaryPending,
    BoundaryConfirmed,
    SetbacksApplied,
    FootprintApplied,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::BoundaryPending => "boundary_pending",
            WorkflowStage::BoundaryConfirmed => "boundary_confirmed",
            WorkflowStage::SetbacksApplied => "setbacks_applied",
            WorkflowStage::FootprintApplied => "footprint_applied",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the current inspection state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatus {
    pub stage: WorkflowStage,
    pub has_boundary: bool,
    pub boundary_locked: bool,
    pub site_area_m2: f64,
    pub perimeter_m: f64,
    pub has_buildable_area: bool,
    pub buildable_area_m2: f64,
    pub coverage_ratio: f64,
    pub has_footprint: bool,
    pub footprint_locked: bool,
    pub footprint_area_m2: f64,
}

/// Human readable area: hectares above 10 000 m², whole square meters otherwise
pub fn area_text(area_m2: f64) -> String {
    if area_m2 > 10_000.0 {
        format!("{:.2} hectares", area_m2 / 10_000.0)
    } else {
        format!("{:.0} m²", area_m2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_rotation_wraps() {
        let mut record = TransformRecord::default();
        record.add_rotation(3.0 * PI);
        assert!((record.rotation_radians - PI).abs() < 1e-12);

        record.add_rotation(-2.0 * PI - 0.5);
        assert!(record.rotation_radians >= 0.0 && record.rotation_radians < TAU);
        assert!((record.rotation_radians - (PI - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_scale_is_multiplicative() {
        let mut record = TransformRecord::default();
        record.add_scale(2.0);
        record.add_scale(1.5);
        assert!((record.scale_factor - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(WorkflowStage::BoundaryPending < WorkflowStage::BoundaryConfirmed);
        assert!(WorkflowStage::SetbacksApplied < WorkflowStage::FootprintApplied);
        assert_eq!(
            serde_json::to_string(&WorkflowStage::SetbacksApplied).unwrap(),
            "\"setbacks_applied\""
        );
    }

    #[test]
    fn test_area_text() {
        assert_eq!(area_text(812.4), "812 m²");
        assert_eq!(area_text(25_000.0), "2.50 hectares");
    }
}
