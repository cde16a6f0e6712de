//! In-memory snapshot store for development and testing.

use async_trait::async_trait;
use serde_json::Value;
use siteinspect_core::error::Result;
use siteinspect_core::models::{ProjectId, RawSnapshot, SnapshotKind};
use siteinspect_core::ports::SnapshotStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps the latest snapshot of each kind per project
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    projects: Arc<RwLock<HashMap<ProjectId, Vec<RawSnapshot>>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project with snapshots as they would arrive from the persistence API
    pub async fn insert_raw(&self, project: ProjectId, snapshot: RawSnapshot) {
        let mut projects = self.projects.write().await;
        let snapshots = projects.entry(project).or_default();
        snapshots.retain(|s| s.kind != snapshot.kind);
        snapshots.push(snapshot);
    }

    /// Number of snapshots stored for a project
    pub async fn count(&self, project: ProjectId) -> usize {
        self.projects.read().await.get(&project).map_or(0, Vec::len)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load_snapshots(&self, project: ProjectId) -> Result<Vec<RawSnapshot>> {
        let projects = self.projects.read().await;
        let mut snapshots = projects.get(&project).cloned().unwrap_or_default();
        snapshots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(snapshots)
    }

    async fn save_snapshot(&self, project: ProjectId, kind: SnapshotKind, data: Value) -> Result<()> {
        debug!(%project, %kind, "Saving snapshot in memory");
        self.insert_raw(project, RawSnapshot::new(kind, data)).await;
        Ok(())
    }
}
