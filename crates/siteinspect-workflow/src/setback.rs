//! Edge selection, setback classification and buildable-area request handling.
//!
//! The engine is an explicit state machine:
//!
//! ```text
//! NoBoundary -> EdgesAvailable -> SelectingEdges -> EdgesSelected -> PreviewReady -> Confirmed
//! ```
//!
//! The offset geometry itself is computed by a [`BuildableAreaService`]; this
//! module shapes the request and normalizes whatever comes back.
//!
//! [`BuildableAreaService`]: siteinspect_core::ports::BuildableAreaService

use serde_json::Value;
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{
    classify_edges, extract_points, BuildableArea, BuildableAreaRequest, BuildableAreaResponse,
    Edge, EdgeClassification, EdgeSelection, Point, Ring, SetbackSpec,
};
use siteinspect_geo::{nearest_edge, polygon_area_m2};
use tracing::{debug, warn};

/// Maximum distance in degrees between a click and the edge it selects
pub const EDGE_CLICK_THRESHOLD: f64 = 1e-4;

/// Frontage sent when no front edge has been chosen
pub const DEFAULT_FRONTAGE: &str = "north";

/// Frontage sent when the front edge is given explicitly
pub const CUSTOM_FRONTAGE: &str = "custom";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SetbackState {
    #[default]
    NoBoundary,
    EdgesAvailable,
    SelectingEdges { front: Option<Edge> },
    EdgesSelected { selection: EdgeSelection },
    PreviewReady { selection: EdgeSelection, preview: BuildableArea },
    Confirmed { selection: EdgeSelection, area: BuildableArea },
}

impl SetbackState {
    pub fn name(&self) -> &'static str {
        match self {
            SetbackState::NoBoundary => "no_boundary",
            SetbackState::EdgesAvailable => "edges_available",
            SetbackState::SelectingEdges { .. } => "selecting_edges",
            SetbackState::EdgesSelected { .. } => "edges_selected",
            SetbackState::PreviewReady { .. } => "preview_ready",
            SetbackState::Confirmed { .. } => "confirmed",
        }
    }
}

/// How the user points at an edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeTarget {
    Index(usize),
    Click(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectOutcome {
    FrontSelected(Edge),
    /// Both edges chosen; selection mode has ended
    BackSelected(EdgeSelection),
    /// The front edge was picked again
    SameEdge,
    /// No edge matches the target
    NoEdgeNearby,
    /// Not in selection mode
    Ignored,
}

/// Setback state for the current boundary
#[derive(Debug, Clone, Default)]
pub struct SetbackEngine {
    state: SetbackState,
    site_ring: Option<Ring>,
    site_area_m2: f64,
    edges: Vec<Edge>,
    setbacks: SetbackSpec,
    /// Outlives later previews until the boundary changes
    confirmed: Option<BuildableArea>,
}

impl SetbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SetbackState {
        &self.state
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn setbacks(&self) -> SetbackSpec {
        self.setbacks
    }

    pub fn site_area_m2(&self) -> f64 {
        self.site_area_m2
    }

    /// Current selection, possibly partial
    pub fn selection(&self) -> EdgeSelection {
        match &self.state {
            SetbackState::NoBoundary | SetbackState::EdgesAvailable => EdgeSelection::default(),
            SetbackState::SelectingEdges { front } => EdgeSelection { front: *front, back: None },
            SetbackState::EdgesSelected { selection }
            | SetbackState::PreviewReady { selection, .. }
            | SetbackState::Confirmed { selection, .. } => *selection,
        }
    }

    /// Preview or confirmed buildable area currently on display
    pub fn buildable_area(&self) -> Option<&BuildableArea> {
        match &self.state {
            SetbackState::PreviewReady { preview, .. } => Some(preview),
            SetbackState::Confirmed { area, .. } => Some(area),
            _ => self.confirmed.as_ref(),
        }
    }

    /// Last confirmed buildable area for the current boundary
    pub fn confirmed_area(&self) -> Option<&BuildableArea> {
        self.confirmed.as_ref()
    }

    /// Take the edges of a new or reloaded boundary; any previous selection is dropped
    pub fn set_boundary(&mut self, ring: Ring, site_area_m2: f64, edges: Vec<Edge>) {
        self.state = if edges.is_empty() { SetbackState::NoBoundary } else { SetbackState::EdgesAvailable };
        self.site_ring = Some(ring);
        self.site_area_m2 = site_area_m2;
        self.edges = edges;
        self.confirmed = None;
    }

    /// Forget the boundary together with the selection and any buildable area
    pub fn clear_boundary(&mut self) {
        self.state = SetbackState::NoBoundary;
        self.site_ring = None;
        self.site_area_m2 = 0.0;
        self.edges.clear();
        self.confirmed = None;
    }

    /// Start choosing the front and back edges, discarding any earlier choice
    pub fn enter_selection(&mut self) -> Result<()> {
        if self.edges.is_empty() {
            return Err(SiteError::NoBoundary);
        }
        self.state = SetbackState::SelectingEdges { front: None };
        Ok(())
    }

    fn resolve(&self, target: EdgeTarget) -> Option<Edge> {
        let index = match target {
            EdgeTarget::Index(index) => index,
            EdgeTarget::Click(point) => nearest_edge(&self.edges, &point, EDGE_CLICK_THRESHOLD)?,
        };
        self.edges.get(index).copied()
    }

    /// Pick an edge: the first pick is the front, a different second pick the back
    pub fn select_edge(&mut self, target: EdgeTarget) -> Result<SelectOutcome> {
        if self.edges.is_empty() {
            return Err(SiteError::NoBoundary);
        }
        let SetbackState::SelectingEdges { front } = self.state else {
            return Ok(SelectOutcome::Ignored);
        };
        let Some(edge) = self.resolve(target) else {
            return Ok(SelectOutcome::NoEdgeNearby);
        };

        match front {
            None => {
                self.state = SetbackState::SelectingEdges { front: Some(edge) };
                Ok(SelectOutcome::FrontSelected(edge))
            }
            Some(front) if front.index == edge.index => Ok(SelectOutcome::SameEdge),
            Some(front) => {
                let selection = EdgeSelection { front: Some(front), back: Some(edge) };
                self.state = SetbackState::EdgesSelected { selection };
                Ok(SelectOutcome::BackSelected(selection))
            }
        }
    }

    /// Restore a persisted selection of `[front, back]` edge indices
    pub fn restore_selection(&mut self, indices: &[usize]) -> bool {
        let (Some(&front), Some(&back)) = (indices.first(), indices.get(1)) else {
            return false;
        };
        match (self.edges.get(front), self.edges.get(back)) {
            (Some(f), Some(b)) if front != back => {
                let selection = EdgeSelection { front: Some(*f), back: Some(*b) };
                self.state = SetbackState::EdgesSelected { selection };
                true
            }
            _ => false,
        }
    }

    /// Store new setback distances and return the resulting classification.
    ///
    /// Requires both edges to be selected. A displayed preview becomes stale and
    /// is dropped until the next recompute arrives.
    pub fn set_setbacks(&mut self, setbacks: SetbackSpec) -> Result<Vec<EdgeClassification>> {
        if self.edges.is_empty() {
            return Err(SiteError::NoBoundary);
        }
        let selection = self.selection();
        if !selection.is_complete() {
            return Err(SiteError::EdgesNotSelected);
        }
        self.setbacks = setbacks;
        if matches!(self.state, SetbackState::PreviewReady { .. }) {
            self.state = SetbackState::EdgesSelected { selection };
        }
        Ok(self.classifications())
    }

    /// Role and setback of every edge under the current selection
    pub fn classifications(&self) -> Vec<EdgeClassification> {
        classify_edges(&self.edges, &self.selection(), &self.setbacks)
    }

    /// Request for the computation service from the current state
    pub fn build_request(&self) -> Result<BuildableAreaRequest> {
        let ring = self.site_ring.as_ref().ok_or(SiteError::NoBoundary)?;
        Ok(shape_request(ring, &self.edges, &self.selection(), &self.setbacks))
    }

    /// Show a preview result, or clear the current preview with `None`.
    ///
    /// Ignored unless a complete selection exists and nothing newer was confirmed
    /// for it.
    pub fn apply_preview(&mut self, preview: Option<BuildableArea>) -> bool {
        let selection = self.selection();
        if !selection.is_complete() {
            return false;
        }
        self.state = match (preview, &self.state) {
            (Some(preview), _) => SetbackState::PreviewReady { selection, preview },
            (None, SetbackState::PreviewReady { .. }) => SetbackState::EdgesSelected { selection },
            (None, _) => return false,
        };
        true
    }

    /// Record a confirmed buildable area
    pub fn confirm(&mut self, mut area: BuildableArea) -> Result<()> {
        if self.edges.is_empty() {
            return Err(SiteError::NoBoundary);
        }
        area.preview = false;
        let selection = self.selection();
        self.confirmed = Some(area.clone());
        self.state = SetbackState::Confirmed { selection, area };
        Ok(())
    }

    /// Restore a confirmed result loaded from storage.
    ///
    /// An area whose stored selection no longer matches the boundary is still
    /// shown, without a selection.
    pub fn restore(&mut self, setbacks: SetbackSpec, selected_edges: &[usize], area: Option<BuildableArea>) {
        self.setbacks = setbacks;
        let selected = self.restore_selection(selected_edges);
        if !selected {
            debug!(?selected_edges, "Stored edge selection does not match the boundary");
        }
        if let Some(mut area) = area {
            area.preview = false;
            self.confirmed = Some(area.clone());
            if selected {
                self.state = SetbackState::Confirmed { selection: self.selection(), area };
            }
        }
    }
}

/// Shape a deterministic request from boundary, selection and setbacks
pub fn shape_request(
    ring: &Ring,
    edges: &[Edge],
    selection: &EdgeSelection,
    setbacks: &SetbackSpec,
) -> BuildableAreaRequest {
    let frontage = if selection.front.is_some() { CUSTOM_FRONTAGE } else { DEFAULT_FRONTAGE };
    BuildableAreaRequest {
        site_coords: ring.closed().into_points(),
        frontage: frontage.to_string(),
        requirements: (*setbacks).into(),
        edge_classifications: classify_edges(edges, selection, setbacks),
    }
}

/// Swap a `[lat, lng]` pair that arrived in the wrong order
fn fix_axis_order(point: Point) -> Point {
    let swapped = Point::new(point.lat, point.lng);
    if !point.is_in_range() && swapped.is_in_range() {
        swapped
    } else {
        point
    }
}

/// Normalize coordinates from a service response into a closed ring
pub fn normalize_coords(value: &Value) -> Option<Ring> {
    let points: Vec<Point> = extract_points(value)
        .into_iter()
        .map(fix_axis_order)
        .filter(Point::is_in_range)
        .collect();
    let ring = Ring::new(points).closed();
    (ring.distinct_count() >= 3).then_some(ring)
}

/// Turn a service response into a buildable area.
///
/// Returns `EmptyResult` when the service reports an error or no usable polygon.
/// Missing area and coverage figures are computed locally.
pub fn normalize_response(
    response: &BuildableAreaResponse,
    site_area_m2: f64,
    preview: bool,
) -> Result<BuildableArea> {
    if let Some(error) = &response.error {
        warn!(error = %error, "Buildable area service reported an error");
        return Err(SiteError::EmptyResult);
    }
    let ring = normalize_coords(&response.buildable_coords).ok_or(SiteError::EmptyResult)?;

    let area_m2 = if response.buildable_area_m2 > 0.0 {
        response.buildable_area_m2
    } else {
        polygon_area_m2(&ring)
    };
    let site_area = if response.site_area_m2 > 0.0 { response.site_area_m2 } else { site_area_m2 };
    let coverage_ratio = if response.coverage_ratio > 0.0 {
        response.coverage_ratio
    } else if site_area > 0.0 {
        area_m2 / site_area
    } else {
        0.0
    };

    Ok(BuildableArea {
        ring,
        area_m2,
        coverage_ratio,
        calculation_method: if response.calculation_method.is_empty() {
            "unknown".to_string()
        } else {
            response.calculation_method.clone()
        },
        preview,
    })
}
