//! Point-by-point polygon drawing shared by the boundary and footprint tools.

use serde::Serialize;
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{Point, Ring};
use siteinspect_geo::{distance_meters, point_in_polygon};
use tracing::debug;

/// Points closer than this (degrees, per component) to the previous point are ignored
pub const DUPLICATE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing { points: Vec<Point> },
}

/// Result of offering a point to a builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPointOutcome {
    Added { count: usize },
    /// Within [`DUPLICATE_EPSILON`] of the last point
    Duplicate,
    /// Outside the containment ring; the caller should tell the user
    OutsideBoundary,
    /// The builder is not drawing
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Edge,
    Live,
    Closing,
}

/// Distance label anchored at a segment midpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionLabel {
    pub position: Point,
    pub distance_m: f64,
    pub text: String,
    pub kind: LabelKind,
}

impl DimensionLabel {
    pub fn between(start: &Point, end: &Point, kind: LabelKind) -> Self {
        let distance_m = distance_meters(start, end);
        Self {
            position: start.midpoint(end),
            distance_m,
            text: format_distance(distance_m),
            kind,
        }
    }
}

pub fn format_distance(meters: f64) -> String {
    format!("{:.1} m", meters)
}

/// Provisional geometry shown while drawing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawPreview {
    /// Segment from the last accumulated point to the cursor
    pub live_segment: Option<(Point, Point)>,
    /// Tentative closed polygon (points, cursor, first point)
    pub polygon: Option<Ring>,
    pub labels: Vec<DimensionLabel>,
}

/// Drawing state machine: `Idle -> Drawing -> Idle`
#[derive(Debug, Clone, Default)]
pub struct PolygonBuilder {
    state: DrawState,
    containment: Option<Ring>,
}

impl PolygonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose points must fall inside `ring`
    pub fn contained_by(ring: Ring) -> Self {
        Self { state: DrawState::Idle, containment: Some(ring) }
    }

    pub fn set_containment(&mut self, ring: Option<Ring>) {
        self.containment = ring;
    }

    pub fn containment(&self) -> Option<&Ring> {
        self.containment.as_ref()
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// Accumulated points; empty when idle
    pub fn points(&self) -> &[Point] {
        match &self.state {
            DrawState::Drawing { points } => points,
            DrawState::Idle => &[],
        }
    }

    /// Discard any accumulated points and start drawing
    pub fn start(&mut self) {
        self.state = DrawState::Drawing { points: Vec::new() };
    }

    /// Offer a point to the builder.
    ///
    /// Out-of-range coordinates are an `InvalidGeometry` error; duplicates and
    /// points outside the containment ring are reported through the outcome.
    pub fn add_point(&mut self, point: Point) -> Result<AddPointOutcome> {
        let DrawState::Drawing { points } = &mut self.state else {
            return Ok(AddPointOutcome::Ignored);
        };

        if !point.is_in_range() {
            return Err(SiteError::invalid_geometry(format!(
                "Point ({}, {}) is outside the valid coordinate range",
                point.lng, point.lat
            )));
        }

        if points.last().is_some_and(|last| last.approx_eq(&point, DUPLICATE_EPSILON)) {
            debug!(lng = point.lng, lat = point.lat, "Ignoring duplicate point");
            return Ok(AddPointOutcome::Duplicate);
        }

        if let Some(ring) = &self.containment {
            if !point_in_polygon(&point, ring) {
                return Ok(AddPointOutcome::OutsideBoundary);
            }
        }

        points.push(point);
        Ok(AddPointOutcome::Added { count: points.len() })
    }

    /// Remove the most recent point
    pub fn undo_last_point(&mut self) -> Option<Point> {
        match &mut self.state {
            DrawState::Drawing { points } => points.pop(),
            DrawState::Idle => None,
        }
    }

    /// Preview for the current points with the cursor at `cursor`
    pub fn preview_at(&self, cursor: Point) -> DrawPreview {
        let points = self.points();
        let Some(last) = points.last() else {
            return DrawPreview::default();
        };

        let mut labels: Vec<DimensionLabel> = points
            .windows(2)
            .map(|pair| DimensionLabel::between(&pair[0], &pair[1], LabelKind::Edge))
            .collect();
        labels.push(DimensionLabel::between(last, &cursor, LabelKind::Live));
        if points.len() >= 3 {
            labels.push(DimensionLabel::between(&cursor, &points[0], LabelKind::Closing));
        }
        labels.retain(|label| label.distance_m > 0.0);

        let polygon = (points.len() >= 2).then(|| {
            let mut ring = points.to_vec();
            ring.push(cursor);
            ring.push(points[0]);
            Ring::new(ring)
        });

        DrawPreview { live_segment: Some((*last, cursor)), polygon, labels }
    }

    /// Closed ring for the accumulated points, leaving the builder drawing.
    ///
    /// With fewer than 3 points this is `InsufficientPoints`. A last point
    /// within [`DUPLICATE_EPSILON`] of the first is the closing click and is
    /// replaced by the first point; other points are kept as entered.
    pub fn closing_ring(&self) -> Result<Ring> {
        let points = self.points();
        if !self.is_drawing() || points.len() < 3 {
            return Err(SiteError::InsufficientPoints { count: points.len() });
        }

        let mut points = points.to_vec();
        if points.len() > 3 && points[points.len() - 1].approx_eq(&points[0], DUPLICATE_EPSILON) {
            points.pop();
        }
        Ok(Ring::new(points).closed())
    }

    /// Close the accumulated points into a ring and return to idle.
    ///
    /// On error the builder keeps drawing.
    pub fn finish(&mut self) -> Result<Ring> {
        let ring = self.closing_ring()?;
        self.state = DrawState::Idle;
        Ok(ring)
    }

    /// Discard the accumulated points and return to idle
    pub fn cancel(&mut self) {
        self.state = DrawState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lng: f64, lat: f64) -> Point {
        Point::new(lng, lat)
    }

    fn drawing_with(points: &[Point]) -> PolygonBuilder {
        let mut builder = PolygonBuilder::new();
        builder.start();
        for point in points {
            builder.add_point(*point).unwrap();
        }
        builder
    }

    #[test]
    fn test_finish_closes_ring() {
        let (p0, p1, p2) = (p(0.0, 0.0), p(0.0, 0.001), p(0.001, 0.001));
        let mut builder = drawing_with(&[p0, p1, p2]);

        let ring = builder.finish().unwrap();
        assert_eq!(ring.points(), &[p0, p1, p2, p0]);
        assert_eq!(siteinspect_geo::edges_of(&ring).len(), 3);
        assert!(!builder.is_drawing());
    }

    #[test]
    fn test_closing_click_snaps_to_first_point() {
        let (p0, p1, p2, p3) = (p(0.0, 0.0), p(0.0, 0.001), p(0.001, 0.001), p(0.001, 0.0));
        let near_start = p(0.0000004, -0.0000003);
        let mut builder = drawing_with(&[p0, p1, p2, p3, near_start]);

        let ring = builder.finish().unwrap();
        assert_eq!(ring.points(), &[p0, p1, p2, p3, p0]);
        assert_eq!(siteinspect_geo::edges_of(&ring).len(), 4);
    }

    #[test]
    fn test_closing_ring_keeps_drawing() {
        let mut builder = drawing_with(&[p(0.0, 0.0), p(0.0, 0.001), p(0.001, 0.001)]);
        assert_eq!(builder.closing_ring().unwrap().len(), 4);
        assert!(builder.is_drawing());
        assert_eq!(builder.points().len(), 3);
    }

    #[test]
    fn test_finish_with_two_points_keeps_drawing() {
        let mut builder = drawing_with(&[p(0.0, 0.0), p(0.0, 0.001)]);
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, SiteError::InsufficientPoints { count: 2 }));
        assert!(builder.is_drawing());
        assert_eq!(builder.points().len(), 2);
    }

    #[test]
    fn test_duplicate_point_is_suppressed() {
        let mut builder = drawing_with(&[p(10.0, 10.0)]);
        let outcome = builder.add_point(p(10.0 + 1e-9, 10.0)).unwrap();
        assert_eq!(outcome, AddPointOutcome::Duplicate);
        assert_eq!(builder.points().len(), 1);
    }

    #[test]
    fn test_idle_builder_ignores_points() {
        let mut builder = PolygonBuilder::new();
        assert_eq!(builder.add_point(p(0.0, 0.0)).unwrap(), AddPointOutcome::Ignored);
        assert!(builder.points().is_empty());
    }

    #[test]
    fn test_out_of_range_point_is_rejected() {
        let mut builder = drawing_with(&[]);
        let err = builder.add_point(p(200.0, 0.0)).unwrap_err();
        assert!(matches!(err, SiteError::InvalidGeometry { .. }));
        assert!(builder.points().is_empty());
    }

    #[test]
    fn test_containment() {
        let boundary = Ring::from(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]);
        let mut builder = PolygonBuilder::contained_by(boundary);
        builder.start();

        assert_eq!(builder.add_point(p(2.0, 2.0)).unwrap(), AddPointOutcome::OutsideBoundary);
        assert_eq!(builder.add_point(p(0.5, 0.5)).unwrap(), AddPointOutcome::Added { count: 1 });
    }

    #[test]
    fn test_cancel_discards_points() {
        let mut builder = drawing_with(&[p(0.0, 0.0), p(0.0, 0.001)]);
        builder.cancel();
        assert!(!builder.is_drawing());
        assert!(builder.points().is_empty());
        assert_eq!(builder.preview_at(p(1.0, 1.0)), DrawPreview::default());
    }

    #[test]
    fn test_undo_last_point() {
        let mut builder = drawing_with(&[p(0.0, 0.0), p(0.0, 0.001)]);
        assert_eq!(builder.undo_last_point(), Some(p(0.0, 0.001)));
        assert_eq!(builder.points().len(), 1);
    }

    #[test]
    fn test_preview_with_one_point() {
        let builder = drawing_with(&[p(0.0, 0.0)]);
        let preview = builder.preview_at(p(0.0, 0.001));

        assert_eq!(preview.live_segment, Some((p(0.0, 0.0), p(0.0, 0.001))));
        assert!(preview.polygon.is_none());
        assert_eq!(preview.labels.len(), 1);
        assert_eq!(preview.labels[0].kind, LabelKind::Live);
    }

    #[test]
    fn test_preview_with_three_points() {
        let builder = drawing_with(&[p(0.0, 0.0), p(0.0, 0.001), p(0.001, 0.001)]);
        let preview = builder.preview_at(p(0.001, 0.0));

        let polygon = preview.polygon.unwrap();
        assert!(polygon.is_closed());
        assert_eq!(polygon.len(), 5);

        let kinds: Vec<LabelKind> = preview.labels.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LabelKind::Edge, LabelKind::Edge, LabelKind::Live, LabelKind::Closing]
        );
        assert!(preview.labels[0].text.ends_with(" m"));
    }
}
