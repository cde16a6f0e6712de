//! Payload shapes exchanged with external services and the snapshot store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::geometry::Point;
use super::setback::{EdgeClassification, SetbackSpec};
use crate::error::SiteError;

/// Numeric project identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl ProjectId {
    /// Resolve a raw project id as it arrives from a URL parameter.
    ///
    /// Anything after a stray `?` or `&` is dropped. Absent, empty or non-numeric
    /// ids mean "no project context" and yield `None`.
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.split(['?', '&']).next()?.trim();
        match raw.parse::<u64>() {
            Ok(id) => Some(Self(id)),
            Err(_) => {
                if !raw.is_empty() {
                    tracing::warn!(project_id = raw, "Ignoring non-numeric project id");
                }
                None
            }
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of persisted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    SiteBoundary,
    BuildableArea,
    StructurePlacement,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::SiteBoundary => "site_boundary",
            SnapshotKind::BuildableArea => "buildable_area",
            SnapshotKind::StructurePlacement => "structure_placement",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "site_boundary" => Ok(SnapshotKind::SiteBoundary),
            "buildable_area" => Ok(SnapshotKind::BuildableArea),
            "structure_placement" => Ok(SnapshotKind::StructurePlacement),
            other => Err(SiteError::SnapshotParse { reason: format!("Unknown snapshot type: {}", other) }),
        }
    }
}

/// Snapshot as returned by the persistence API.
///
/// `data` is either an already-parsed JSON value or a string that still needs
/// parsing; interpretation is left to the workflow layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawSnapshot {
    pub fn new(kind: SnapshotKind, data: Value) -> Self {
        Self { kind: kind.as_str().to_string(), data, updated_at: Some(Utc::now()) }
    }
}

/// Setback requirements in the shape the computation service expects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetbackRequirements {
    pub front_setback: f64,
    pub side_setback: f64,
    pub rear_setback: f64,
}

impl From<SetbackSpec> for SetbackRequirements {
    fn from(spec: SetbackSpec) -> Self {
        Self { front_setback: spec.front, side_setback: spec.side, rear_setback: spec.back }
    }
}

/// Request to the buildable-area computation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildableAreaRequest {
    pub site_coords: Vec<Point>,
    pub frontage: String,
    pub requirements: SetbackRequirements,
    pub edge_classifications: Vec<EdgeClassification>,
}

/// Response from the buildable-area computation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildableAreaResponse {
    /// Coordinates as returned; may be nested or in swapped order
    #[serde(default)]
    pub buildable_coords: Value,
    #[serde(default)]
    pub buildable_area_m2: f64,
    #[serde(default)]
    pub site_area_m2: f64,
    #[serde(default)]
    pub coverage_ratio: f64,
    #[serde(default = "unknown_method")]
    pub calculation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unknown_method() -> String {
    "unknown".to_string()
}

/// Geocoding request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeLocation {
    pub lng: f64,
    pub lat: f64,
}

/// Geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub location: GeocodeLocation,
    pub display_name: String,
}

impl GeocodeResult {
    pub fn point(&self) -> Point {
        Point::new(self.location.lng, self.location.lat)
    }
}
