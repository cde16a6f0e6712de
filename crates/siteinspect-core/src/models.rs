pub mod geometry;
pub mod setback;
pub mod site;
pub mod wire;

pub use geometry::{extract_points, Edge, Point, Ring, TerrainBounds};
pub use setback::{
    classify_edges, parse_distance, EdgeClassification, EdgeRole, EdgeSelection,
    EdgeSelectionRecord, SetbackSpec,
};
pub use site::{
    area_text, BoundaryPolygon, BuildableArea, Footprint, SiteStatus, TransformRecord,
    WorkflowStage,
};
pub use wire::{
    BuildableAreaRequest, BuildableAreaResponse, GeocodeLocation, GeocodeRequest, GeocodeResult,
    ProjectId, RawSnapshot, SetbackRequirements, SnapshotKind,
};
