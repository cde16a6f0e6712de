//! The site inspector workflow: boundary, setbacks and footprint in one place.
//!
//! [`SiteInspector`] is built once with its collaborators and handed to whatever
//! drives it. Failures are published as [`Notice`] events and returned to the
//! caller; a failing stage never disturbs the others.

use std::sync::Arc;
use std::time::Duration;

use geojson::FeatureCollection;
use serde_json::Value;
use siteinspect_core::config::LayeredConfig;
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{
    BoundaryPolygon, BuildableArea, EdgeClassification, Footprint, Point, ProjectId, RawSnapshot,
    SetbackSpec, SiteStatus, SnapshotKind, TerrainBounds, WorkflowStage,
};
use siteinspect_core::ports::{BuildableAreaService, SnapshotStore};
use siteinspect_geo::{polygon_area_m2, DEFAULT_COLLINEAR_TOLERANCE, DEFAULT_TERRAIN_BUFFER_M};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::boundary::BoundaryModel;
use crate::drawing::{AddPointOutcome, DimensionLabel, PolygonBuilder};
use crate::events::{EventBus, Notice, WorkflowEvent};
use crate::footprint::{FootprintBuilder, StartOutcome, TransformOutcome};
use crate::recompute::{PreviewOutcome, PreviewScheduler, DEFAULT_DEBOUNCE};
use crate::render;
use crate::setback::{normalize_response, EdgeTarget, SelectOutcome, SetbackEngine, SetbackState};
use crate::snapshot::{
    boundary_payload, buildable_payload, footprint_payload, parse_snapshot, SnapshotContent,
};

/// Tunables the workflow reads from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowSettings {
    pub debounce: Duration,
    pub collinear_tolerance: f64,
    pub terrain_buffer_m: f64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            collinear_tolerance: DEFAULT_COLLINEAR_TOLERANCE,
            terrain_buffer_m: DEFAULT_TERRAIN_BUFFER_M,
        }
    }
}

impl From<&LayeredConfig> for WorkflowSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            debounce: config.debounce(),
            collinear_tolerance: config.collinear_tolerance.value,
            terrain_buffer_m: config.terrain_buffer_m.value,
        }
    }
}

/// What [`SiteInspector::load_project`] restored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub boundary: bool,
    pub buildable_area: bool,
    pub footprint: bool,
}

/// Renderable layers for the current state
#[derive(Debug, Clone, Default)]
pub struct MapLayers {
    pub boundary: Option<FeatureCollection>,
    pub buildable_area: Option<FeatureCollection>,
    pub footprint: Option<FeatureCollection>,
}

pub struct SiteInspector {
    settings: WorkflowSettings,
    project: Option<ProjectId>,
    store: Option<Arc<dyn SnapshotStore>>,
    service: Option<Arc<dyn BuildableAreaService>>,
    events: EventBus,
    stage: WorkflowStage,
    boundary_drawing: PolygonBuilder,
    boundary: BoundaryModel,
    setbacks: SetbackEngine,
    footprint: FootprintBuilder,
    preview: PreviewScheduler,
}

impl SiteInspector {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            project: None,
            store: None,
            service: None,
            events: EventBus::default(),
            stage: WorkflowStage::default(),
            boundary_drawing: PolygonBuilder::new(),
            boundary: BoundaryModel::new(),
            setbacks: SetbackEngine::new(),
            footprint: FootprintBuilder::new(settings.collinear_tolerance),
            preview: PreviewScheduler::new(settings.debounce),
        }
    }

    pub fn with_project(mut self, project: Option<ProjectId>) -> Self {
        self.project = project;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_buildable_service(mut self, service: Arc<dyn BuildableAreaService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    pub fn boundary(&self) -> Option<&BoundaryPolygon> {
        self.boundary.boundary()
    }

    pub fn setback_engine(&self) -> &SetbackEngine {
        &self.setbacks
    }

    /// Buildable area on display, preview or confirmed
    pub fn buildable_area(&self) -> Option<&BuildableArea> {
        self.setbacks.buildable_area()
    }

    pub fn footprint(&self) -> Option<&Footprint> {
        self.footprint.footprint()
    }

    pub fn boundary_points(&self) -> &[Point] {
        self.boundary_drawing.points()
    }

    fn report(&self, err: &SiteError) {
        warn!(error = %err, stage = %self.stage, "Workflow action failed");
        self.events.notify(Notice::from(err));
    }

    fn fail<T>(&self, err: SiteError) -> Result<T> {
        self.report(&err);
        Err(err)
    }

    fn set_stage(&mut self, to: WorkflowStage) {
        let from = self.stage;
        if from != to {
            self.stage = to;
            info!(%from, %to, "Workflow stage changed");
            self.events.publish(WorkflowEvent::StageChanged { from, to });
        }
    }

    fn advance_to(&mut self, stage: WorkflowStage) {
        if stage > self.stage {
            self.set_stage(stage);
        }
    }

    fn regress_to(&mut self, stage: WorkflowStage) {
        if stage < self.stage {
            self.set_stage(stage);
        }
    }

    async fn persist(&self, kind: SnapshotKind, data: Value) -> Result<()> {
        let (Some(store), Some(project)) = (&self.store, self.project) else {
            debug!(%kind, "No project context, snapshot kept in memory only");
            return Ok(());
        };
        store.save_snapshot(project, kind, data).await
    }

    // Boundary

    /// Begin drawing a boundary. Refused while the boundary is locked.
    pub fn start_boundary(&mut self) -> bool {
        if self.boundary.is_locked() {
            self.events.notify(Notice::warning("Unlock the site boundary before redrawing it"));
            return false;
        }
        self.boundary_drawing.start();
        true
    }

    pub fn add_boundary_point(&mut self, point: Point) -> Result<AddPointOutcome> {
        match self.boundary_drawing.add_point(point) {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.fail(err),
        }
    }

    pub fn undo_boundary_point(&mut self) -> Option<Point> {
        self.boundary_drawing.undo_last_point()
    }

    pub fn boundary_preview(&self, cursor: Point) -> FeatureCollection {
        let preview = self.boundary_drawing.preview_at(cursor);
        render::preview_layer(self.boundary_drawing.points(), &preview)
    }

    pub fn cancel_boundary(&mut self) {
        self.boundary_drawing.cancel();
    }

    fn on_boundary_changed(&mut self, boundary: &BoundaryPolygon) {
        self.preview.cancel();
        self.setbacks.set_boundary(boundary.ring.clone(), boundary.area_m2, boundary.edges.clone());
        self.footprint.set_containment(Some(boundary.ring.clone()));
        self.events.publish(WorkflowEvent::BoundaryCreated {
            area_m2: boundary.area_m2,
            perimeter_m: boundary.perimeter_m,
            edge_count: boundary.edges.len(),
        });
        self.advance_to(WorkflowStage::BoundaryConfirmed);
    }

    /// Close the drawn boundary, measure it and save it.
    ///
    /// A failed save is reported but the boundary stays in place.
    pub async fn finish_boundary(&mut self) -> Result<BoundaryPolygon> {
        // Drawing continues until the ring is accepted
        let ring = match self.boundary_drawing.closing_ring() {
            Ok(ring) => ring,
            Err(err) => return self.fail(err),
        };
        let boundary = match self.boundary.create(ring) {
            Ok(boundary) => boundary.clone(),
            Err(err) => return self.fail(err),
        };
        self.boundary_drawing.cancel();
        self.regress_to(WorkflowStage::BoundaryConfirmed);
        self.on_boundary_changed(&boundary);

        if let Err(err) = self.persist(SnapshotKind::SiteBoundary, boundary_payload(&boundary)).await {
            self.report(&err);
        }
        Ok(boundary)
    }

    /// Drop the boundary and everything derived from it; an existing footprint stays
    pub fn clear_boundary(&mut self) {
        self.preview.cancel();
        self.boundary_drawing.cancel();
        self.boundary.clear();
        self.setbacks.clear_boundary();
        self.footprint.set_containment(None);
        self.events.publish(WorkflowEvent::BoundaryCleared);
        self.regress_to(WorkflowStage::BoundaryPending);
    }

    pub fn toggle_boundary_lock(&mut self) -> Result<bool> {
        match self.boundary.toggle_lock() {
            Ok(locked) => {
                self.events.publish(WorkflowEvent::BoundaryLockChanged { locked });
                Ok(locked)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn terrain_bounds(&self) -> Option<TerrainBounds> {
        self.boundary.terrain_bounds(self.settings.terrain_buffer_m)
    }

    // Setbacks

    pub fn enter_edge_selection(&mut self) -> Result<()> {
        if let Err(err) = self.setbacks.enter_selection() {
            return self.fail(err);
        }
        self.preview.cancel();
        self.events.publish(WorkflowEvent::EdgeSelectionChanged { front: None, back: None });
        Ok(())
    }

    /// Pick the front, then the back edge. Completing the pair triggers a preview.
    pub fn select_edge(&mut self, target: EdgeTarget) -> Result<SelectOutcome> {
        let outcome = match self.setbacks.select_edge(target) {
            Ok(outcome) => outcome,
            Err(err) => return self.fail(err),
        };
        match outcome {
            SelectOutcome::FrontSelected(edge) => {
                self.events.publish(WorkflowEvent::EdgeSelectionChanged { front: Some(edge.index), back: None });
            }
            SelectOutcome::BackSelected(selection) => {
                self.events.publish(WorkflowEvent::EdgeSelectionChanged {
                    front: selection.front.map(|e| e.index),
                    back: selection.back.map(|e| e.index),
                });
                self.request_preview();
            }
            SelectOutcome::NoEdgeNearby => {
                self.events.notify(Notice::info("No edge near that point"));
            }
            SelectOutcome::SameEdge | SelectOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Apply new setback distances and schedule a preview
    pub fn set_setbacks(&mut self, setbacks: SetbackSpec) -> Result<Vec<EdgeClassification>> {
        let had_preview = matches!(self.setbacks.state(), SetbackState::PreviewReady { .. });
        let classifications = match self.setbacks.set_setbacks(setbacks) {
            Ok(classifications) => classifications,
            Err(err) => return self.fail(err),
        };
        self.events.publish(WorkflowEvent::SetbacksChanged { classifications: classifications.clone() });
        if had_preview {
            self.events.publish(WorkflowEvent::PreviewCleared);
        }
        self.request_preview();
        Ok(classifications)
    }

    fn request_preview(&mut self) {
        let Some(service) = self.service.clone() else {
            debug!("No buildable area service, skipping preview");
            return;
        };
        match self.setbacks.build_request() {
            Ok(request) => {
                let generation = self.preview.schedule(service, request, self.setbacks.site_area_m2());
                debug!(generation, "Preview scheduled");
            }
            Err(err) => debug!(error = %err, "Preview not scheduled"),
        }
    }

    fn apply_preview_outcome(&mut self, outcome: PreviewOutcome) -> bool {
        match outcome.result {
            Ok(area) => {
                let (area_m2, coverage_ratio) = (area.area_m2, area.coverage_ratio);
                let applied = self.setbacks.apply_preview(Some(area));
                if applied {
                    self.events.publish(WorkflowEvent::PreviewUpdated { area_m2, coverage_ratio });
                }
                applied
            }
            Err(err) => {
                debug!(error = %err, generation = outcome.generation, "Preview failed");
                if self.setbacks.apply_preview(None) {
                    self.events.publish(WorkflowEvent::PreviewCleared);
                }
                false
            }
        }
    }

    /// Wait for the pending preview and apply it. Returns whether a preview is now shown.
    pub async fn await_preview(&mut self) -> bool {
        match self.preview.next_outcome().await {
            Some(outcome) => self.apply_preview_outcome(outcome),
            None => false,
        }
    }

    /// Apply a finished preview without waiting
    pub fn poll_preview(&mut self) -> bool {
        match self.preview.try_next_outcome() {
            Some(outcome) => self.apply_preview_outcome(outcome),
            None => false,
        }
    }

    /// Compute, persist and commit the buildable area.
    ///
    /// Nothing changes on failure: the previous display stays and the error is
    /// surfaced as a retryable notice where that makes sense.
    pub async fn confirm_setbacks(&mut self) -> Result<BuildableArea> {
        let Some(service) = self.service.clone() else {
            return self.fail(SiteError::ConfigMissing { key: "buildable_area_service".to_string() });
        };
        let Some(boundary) = self.boundary.boundary().cloned() else {
            return self.fail(SiteError::NoBoundary);
        };
        let selection = self.setbacks.selection();
        if !selection.is_complete() {
            return self.fail(SiteError::EdgesNotSelected);
        }
        let request = match self.setbacks.build_request() {
            Ok(request) => request,
            Err(err) => return self.fail(err),
        };
        self.preview.cancel();

        let operation = "confirm_setbacks".to_string();
        self.events.publish(WorkflowEvent::Busy { operation: operation.clone(), active: true });
        let setbacks = self.setbacks.setbacks();
        let result = async {
            let response = service.calculate(&request).await?;
            let area = normalize_response(&response, boundary.area_m2, false)?;
            let payload = buildable_payload(&boundary, &area, &setbacks, &selection);
            self.persist(SnapshotKind::BuildableArea, payload).await?;
            Ok::<_, SiteError>(area)
        }
        .await;
        self.events.publish(WorkflowEvent::Busy { operation, active: false });

        let area = match result {
            Ok(area) => area,
            Err(err) => return self.fail(err),
        };
        if let Err(err) = self.setbacks.confirm(area.clone()) {
            return self.fail(err);
        }
        info!(
            area_m2 = area.area_m2,
            coverage_ratio = area.coverage_ratio,
            method = %area.calculation_method,
            "Buildable area confirmed"
        );
        self.events.publish(WorkflowEvent::BuildableAreaConfirmed {
            area_m2: area.area_m2,
            coverage_ratio: area.coverage_ratio,
        });
        self.advance_to(WorkflowStage::SetbacksApplied);
        Ok(area)
    }

    // Footprint

    pub fn start_footprint(&mut self, confirm_replace: bool) -> StartOutcome {
        let outcome = self.footprint.start(confirm_replace);
        if outcome == StartOutcome::ReplaceRequiresConfirmation {
            self.events.notify(Notice::info("The current footprint is locked. Confirm to replace it"));
        }
        outcome
    }

    pub fn add_footprint_point(&mut self, point: Point) -> Result<AddPointOutcome> {
        let outcome = match self.footprint.add_point(point) {
            Ok(outcome) => outcome,
            Err(err) => return self.fail(err),
        };
        if outcome == AddPointOutcome::OutsideBoundary {
            self.events.notify(Notice::warning("Footprint points must be inside the site boundary"));
        }
        Ok(outcome)
    }

    pub fn undo_footprint_point(&mut self) -> Option<Point> {
        self.footprint.undo_last_point()
    }

    pub fn footprint_preview(&self, cursor: Point) -> FeatureCollection {
        let preview = self.footprint.preview_at(cursor);
        render::preview_layer(self.footprint.points(), &preview)
    }

    pub fn cancel_footprint(&mut self) {
        self.footprint.cancel();
    }

    pub async fn finish_footprint(&mut self) -> Result<Footprint> {
        let footprint = match self.footprint.finish() {
            Ok(footprint) => footprint.clone(),
            Err(err) => return self.fail(err),
        };
        self.events.publish(WorkflowEvent::FootprintUpdated { area_m2: footprint.area_m2 });
        self.advance_to(WorkflowStage::FootprintApplied);

        if let Err(err) = self.persist(SnapshotKind::StructurePlacement, footprint_payload(&footprint)).await {
            self.report(&err);
        }
        Ok(footprint)
    }

    fn after_transform(&self, outcome: TransformOutcome) -> TransformOutcome {
        match outcome {
            TransformOutcome::Applied => {
                if let Some(footprint) = self.footprint.footprint() {
                    self.events.publish(WorkflowEvent::FootprintUpdated { area_m2: footprint.area_m2 });
                }
            }
            TransformOutcome::Locked => {
                self.events.notify(Notice::info("The footprint is locked"));
            }
            TransformOutcome::NoFootprint | TransformOutcome::InvalidFactor => {}
        }
        outcome
    }

    pub fn drag_footprint(&mut self, d_lng: f64, d_lat: f64) -> TransformOutcome {
        let outcome = self.footprint.drag(d_lng, d_lat);
        self.after_transform(outcome)
    }

    pub fn rotate_footprint(&mut self, radians: f64) -> TransformOutcome {
        let outcome = self.footprint.rotate(radians);
        self.after_transform(outcome)
    }

    pub fn scale_footprint(&mut self, factor: f64) -> TransformOutcome {
        let outcome = self.footprint.scale(factor);
        self.after_transform(outcome)
    }

    /// Persist the footprint's current placement
    pub async fn save_footprint(&self) -> Result<()> {
        let Some(footprint) = self.footprint.footprint() else {
            return Ok(());
        };
        match self.persist(SnapshotKind::StructurePlacement, footprint_payload(footprint)).await {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    pub fn toggle_footprint_lock(&mut self) -> Result<bool> {
        match self.footprint.toggle_lock() {
            Ok(locked) => {
                self.events.publish(WorkflowEvent::FootprintLockChanged { locked });
                Ok(locked)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn clear_footprint(&mut self) {
        if self.footprint.clear().is_none() {
            return;
        }
        self.events.publish(WorkflowEvent::FootprintCleared);
        let settled = if self.setbacks.confirmed_area().is_some() {
            WorkflowStage::SetbacksApplied
        } else if self.boundary.boundary().is_some() {
            WorkflowStage::BoundaryConfirmed
        } else {
            WorkflowStage::BoundaryPending
        };
        self.regress_to(settled);
    }

    pub fn footprint_labels(&self) -> Vec<DimensionLabel> {
        self.footprint.dimension_labels()
    }

    // Project state

    /// Restore boundary, buildable area and footprint from stored snapshots.
    ///
    /// Without a project context this is a no-op. Unreadable snapshots are
    /// logged and skipped; only a failing store is an error.
    pub async fn load_project(&mut self) -> Result<LoadSummary> {
        let (Some(store), Some(project)) = (self.store.clone(), self.project) else {
            info!("No project context, starting empty");
            return Ok(LoadSummary::default());
        };
        let snapshots = match store.load_snapshots(project).await {
            Ok(snapshots) => snapshots,
            Err(err) => return self.fail(err),
        };
        let find = |kind: SnapshotKind| snapshots.iter().find(|s| s.kind == kind.as_str());
        let mut summary = LoadSummary::default();

        // The buildable-area snapshot also carries the site ring
        summary.boundary =
            find(SnapshotKind::SiteBoundary).is_some_and(|raw| self.restore_boundary(raw));
        if !summary.boundary {
            if let Some(raw) = find(SnapshotKind::BuildableArea) {
                summary.boundary = self.restore_boundary(raw);
            }
        }

        if summary.boundary {
            if let Some(raw) = find(SnapshotKind::BuildableArea) {
                summary.buildable_area = self.restore_buildable(raw);
            }
        }

        if let Some(raw) = find(SnapshotKind::StructurePlacement) {
            summary.footprint = self.restore_footprint(raw);
        }

        info!(%project, ?summary, "Project loaded");
        Ok(summary)
    }

    fn restore_boundary(&mut self, raw: &RawSnapshot) -> bool {
        match self.boundary.load_from_snapshot(raw) {
            Ok(boundary) => {
                let boundary = boundary.clone();
                self.on_boundary_changed(&boundary);
                true
            }
            Err(err) => {
                warn!(error = %err, kind = %raw.kind, "Ignoring unreadable boundary snapshot");
                false
            }
        }
    }

    fn restore_buildable(&mut self, raw: &RawSnapshot) -> bool {
        match parse_snapshot(raw) {
            Ok(SnapshotContent::BuildableArea(content)) => {
                self.setbacks.restore(content.setbacks, &content.selected_edges, content.buildable);
                let restored = self.setbacks.confirmed_area().is_some();
                if restored {
                    self.advance_to(WorkflowStage::SetbacksApplied);
                }
                restored
            }
            Ok(_) => false,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable buildable area snapshot");
                false
            }
        }
    }

    fn restore_footprint(&mut self, raw: &RawSnapshot) -> bool {
        match parse_snapshot(raw) {
            Ok(SnapshotContent::StructurePlacement(content)) => {
                let footprint = Footprint {
                    area_m2: polygon_area_m2(&content.ring),
                    ring: content.ring,
                    transform: content.transform,
                    locked: content.locked,
                };
                self.events.publish(WorkflowEvent::FootprintUpdated { area_m2: footprint.area_m2 });
                self.footprint.restore(footprint);
                self.advance_to(WorkflowStage::FootprintApplied);
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable structure snapshot");
                false
            }
        }
    }

    /// Summary of the current state
    pub fn status(&self) -> SiteStatus {
        let boundary = self.boundary.boundary();
        let confirmed = self.setbacks.confirmed_area();
        let footprint = self.footprint.footprint();
        SiteStatus {
            stage: self.stage,
            has_boundary: boundary.is_some(),
            boundary_locked: boundary.is_some_and(|b| b.locked),
            site_area_m2: boundary.map_or(0.0, |b| b.area_m2),
            perimeter_m: boundary.map_or(0.0, |b| b.perimeter_m),
            has_buildable_area: confirmed.is_some(),
            buildable_area_m2: confirmed.map_or(0.0, |a| a.area_m2),
            coverage_ratio: confirmed.map_or(0.0, |a| a.coverage_ratio),
            has_footprint: footprint.is_some(),
            footprint_locked: footprint.is_some_and(|f| f.locked),
            footprint_area_m2: footprint.map_or(0.0, |f| f.area_m2),
        }
    }

    /// GeoJSON layers for everything that currently exists
    pub fn map_layers(&self) -> MapLayers {
        MapLayers {
            boundary: self
                .boundary
                .boundary()
                .map(|b| render::boundary_layer(b, &self.setbacks.selection())),
            buildable_area: self.setbacks.buildable_area().map(render::buildable_layer),
            footprint: self
                .footprint
                .footprint()
                .map(|f| render::footprint_layer(f, &self.footprint.dimension_labels())),
        }
    }
}
