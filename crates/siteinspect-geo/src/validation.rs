use serde::Serialize;
use siteinspect_core::error::{Result, SiteError};

use crate::models::Ring;

/// Validation result with details
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// Convert into a `Result`, using the first error as the reason
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(error) => Err(SiteError::invalid_geometry(format!(
                "{}: {}",
                error.location, error.reason
            ))),
        }
    }
}

/// Whether a ring is checked as drawn (open allowed) or as finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingCheck {
    Open,
    Closed,
}

/// Validate a ring's coordinates, vertex count and closure
pub fn validate_ring(ring: &Ring, check: RingCheck) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, point) in ring.points().iter().enumerate() {
        if !point.is_in_range() {
            result.add_error(
                format!("Ring[{}]", i),
                format!(
                    "Coordinates ({}, {}) must be finite and within longitude/latitude range",
                    point.lng, point.lat
                ),
            );
        }
    }

    let distinct = ring.distinct_count();
    if distinct < 3 {
        result.add_error(
            "Ring".to_string(),
            format!("Ring must have at least 3 distinct points, found {}", distinct),
        );
    }

    if check == RingCheck::Closed && !ring.is_closed() {
        result.add_error(
            "Ring".to_string(),
            "Ring must be closed (first point == last point)".to_string(),
        );
    }

    result
}

/// Validate a ring and return `InvalidGeometry` with the first problem found
pub fn ensure_valid_ring(ring: &Ring, check: RingCheck) -> Result<()> {
    validate_ring(ring, check).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_closed_ring() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(validate_ring(&ring, RingCheck::Closed).is_valid);
    }

    #[test]
    fn test_open_ring_fails_closed_check() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        assert!(validate_ring(&ring, RingCheck::Open).is_valid);

        let result = validate_ring(&ring, RingCheck::Closed);
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("closed"));
    }

    #[test]
    fn test_too_few_distinct_points() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        let err = ensure_valid_ring(&ring, RingCheck::Closed).unwrap_err();
        assert!(matches!(err, SiteError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let ring = Ring::from(vec![[0.0, 0.0], [0.0, 95.0], [1.0, 1.0]]);
        let result = validate_ring(&ring, RingCheck::Open);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].location, "Ring[1]");
    }
}
