//! Site inspector workflow - boundary, setbacks and footprint
//!
//! This crate holds the interactive state machines of a site inspection and the
//! [`SiteInspector`] that sequences them, persisting through the core ports.

pub mod boundary;
pub mod coordinator;
pub mod drawing;
pub mod events;
pub mod footprint;
pub mod recompute;
pub mod render;
pub mod setback;
pub mod snapshot;

pub use boundary::{build_boundary, BoundaryModel};
pub use coordinator::{LoadSummary, MapLayers, SiteInspector, WorkflowSettings};
pub use drawing::{AddPointOutcome, DimensionLabel, DrawPreview, LabelKind, PolygonBuilder};
pub use events::{EventBus, Notice, NoticeLevel, WorkflowEvent};
pub use footprint::{FootprintBuilder, StartOutcome, TransformOutcome};
pub use recompute::{PreviewOutcome, PreviewScheduler};
pub use setback::{normalize_response, EdgeTarget, SelectOutcome, SetbackEngine, SetbackState};
pub use snapshot::{parse_snapshot, SnapshotContent};
