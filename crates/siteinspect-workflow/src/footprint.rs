//! Structure footprint drawing and manual placement.

use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{Footprint, Point, Ring, TransformRecord};
use siteinspect_geo::{
    distance_meters, edges_of, merge_collinear_ring, polygon_area_m2, rotate_around, scale_around,
    translate, DEFAULT_COLLINEAR_TOLERANCE,
};
use tracing::debug;

use crate::drawing::{AddPointOutcome, DimensionLabel, DrawPreview, LabelKind, PolygonBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A locked footprint exists; call again with replacement confirmed
    ReplaceRequiresConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    Applied,
    Locked,
    NoFootprint,
    /// Scale factor that is not a positive finite number
    InvalidFactor,
}

/// Draws one footprint at a time, optionally kept inside the site boundary
#[derive(Debug, Clone)]
pub struct FootprintBuilder {
    drawing: PolygonBuilder,
    footprint: Option<Footprint>,
    collinear_tolerance: f64,
}

impl Default for FootprintBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_COLLINEAR_TOLERANCE)
    }
}

impl FootprintBuilder {
    pub fn new(collinear_tolerance: f64) -> Self {
        Self { drawing: PolygonBuilder::new(), footprint: None, collinear_tolerance }
    }

    pub fn footprint(&self) -> Option<&Footprint> {
        self.footprint.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_drawing()
    }

    /// Points placed so far in the current drawing
    pub fn points(&self) -> &[Point] {
        self.drawing.points()
    }

    pub fn is_locked(&self) -> bool {
        self.footprint.as_ref().is_some_and(|f| f.locked)
    }

    /// Set or remove the containment boundary for new points
    pub fn set_containment(&mut self, boundary: Option<Ring>) {
        self.drawing.set_containment(boundary);
    }

    pub fn has_containment(&self) -> bool {
        self.drawing.containment().is_some()
    }

    /// Start drawing a new footprint
    pub fn start(&mut self, confirm_replace: bool) -> StartOutcome {
        if self.is_locked() && !confirm_replace {
            return StartOutcome::ReplaceRequiresConfirmation;
        }
        self.drawing.start();
        StartOutcome::Started
    }

    pub fn add_point(&mut self, point: Point) -> Result<AddPointOutcome> {
        self.drawing.add_point(point)
    }

    pub fn undo_last_point(&mut self) -> Option<Point> {
        self.drawing.undo_last_point()
    }

    pub fn preview_at(&self, cursor: Point) -> DrawPreview {
        self.drawing.preview_at(cursor)
    }

    pub fn cancel(&mut self) {
        self.drawing.cancel();
    }

    /// Close the drawn points into the new footprint, replacing any existing one
    pub fn finish(&mut self) -> Result<&Footprint> {
        let ring = self.drawing.closing_ring()?;
        if ring.distinct_count() < 3 {
            return Err(SiteError::invalid_geometry("Footprint needs at least 3 distinct points"));
        }
        self.drawing.cancel();
        let footprint = Footprint {
            area_m2: polygon_area_m2(&ring),
            ring,
            transform: TransformRecord::default(),
            locked: false,
        };
        Ok(self.footprint.insert(footprint))
    }

    /// Put back a footprint loaded from storage
    pub fn restore(&mut self, footprint: Footprint) {
        self.drawing.cancel();
        self.footprint = Some(footprint);
    }

    pub fn clear(&mut self) -> Option<Footprint> {
        self.drawing.cancel();
        self.footprint.take()
    }

    pub fn toggle_lock(&mut self) -> Result<bool> {
        let footprint = self
            .footprint
            .as_mut()
            .ok_or_else(|| SiteError::invalid_geometry("No footprint to lock"))?;
        footprint.locked = !footprint.locked;
        Ok(footprint.locked)
    }

    fn transform_with(
        &mut self,
        apply: impl FnOnce(&Ring) -> Ring,
        record: impl FnOnce(&mut TransformRecord),
    ) -> TransformOutcome {
        let Some(footprint) = self.footprint.as_mut() else {
            return TransformOutcome::NoFootprint;
        };
        if footprint.locked {
            debug!("Footprint is locked, ignoring transform");
            return TransformOutcome::Locked;
        }
        footprint.ring = apply(&footprint.ring);
        footprint.area_m2 = polygon_area_m2(&footprint.ring);
        record(&mut footprint.transform);
        TransformOutcome::Applied
    }

    /// Move the footprint by a degree offset
    pub fn drag(&mut self, d_lng: f64, d_lat: f64) -> TransformOutcome {
        self.transform_with(
            |ring| translate(ring, d_lng, d_lat),
            |record| record.add_translation(d_lng, d_lat),
        )
    }

    /// Rotate about the current centroid
    pub fn rotate(&mut self, radians: f64) -> TransformOutcome {
        self.transform_with(
            |ring| rotate_around(ring, None, radians),
            |record| record.add_rotation(radians),
        )
    }

    /// Scale about the current centroid
    pub fn scale(&mut self, factor: f64) -> TransformOutcome {
        if !factor.is_finite() || factor <= 0.0 {
            return TransformOutcome::InvalidFactor;
        }
        self.transform_with(
            |ring| scale_around(ring, None, factor),
            |record| record.add_scale(factor),
        )
    }

    /// Edge length labels after merging near-collinear vertices
    pub fn dimension_labels(&self) -> Vec<DimensionLabel> {
        let Some(footprint) = &self.footprint else {
            return Vec::new();
        };
        let merged = merge_collinear_ring(&footprint.ring, self.collinear_tolerance);
        edges_of(&merged)
            .iter()
            .filter(|edge| distance_meters(&edge.start, &edge.end) > 0.0)
            .map(|edge| DimensionLabel::between(&edge.start, &edge.end, LabelKind::Edge))
            .collect()
    }
}
