//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement. The workflow
//! engine only ever talks to persistence, computation and geocoding through them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    BuildableAreaRequest, BuildableAreaResponse, GeocodeResult, ProjectId, RawSnapshot,
    SnapshotKind,
};

/// Port for project snapshot persistence
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load all snapshots of a project, most recently updated first
    async fn load_snapshots(&self, project: ProjectId) -> Result<Vec<RawSnapshot>>;

    /// Save (replace) the snapshot of the given kind
    async fn save_snapshot(&self, project: ProjectId, kind: SnapshotKind, data: Value)
        -> Result<()>;

    /// Load the most recent snapshot of one kind
    async fn load_snapshot(
        &self,
        project: ProjectId,
        kind: SnapshotKind,
    ) -> Result<Option<RawSnapshot>> {
        let snapshots = self.load_snapshots(project).await?;
        Ok(snapshots.into_iter().find(|s| s.kind == kind.as_str()))
    }
}

/// Port for the buildable-area (setback offset) computation
#[async_trait]
pub trait BuildableAreaService: Send + Sync {
    /// Compute the buildable polygon for a site and its edge classifications
    async fn calculate(&self, request: &BuildableAreaRequest) -> Result<BuildableAreaResponse>;

    /// Name of the backing implementation, used in logs
    fn name(&self) -> &str;
}

/// Port for address lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<GeocodeResult>;
}
