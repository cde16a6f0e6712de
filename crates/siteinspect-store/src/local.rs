//! Buildable-area computation without a remote service.

use async_trait::async_trait;
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{BuildableAreaRequest, BuildableAreaResponse, Ring};
use siteinspect_core::ports::BuildableAreaService;
use siteinspect_geo::{ensure_valid_ring, offset_ring_inward, polygon_area_m2, RingCheck};
use tracing::debug;

pub const LOCAL_METHOD: &str = "local_offset";

/// Offsets each site edge inward by its classified setback
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBuildableAreaService;

impl LocalBuildableAreaService {
    pub fn new() -> Self {
        Self
    }
}

/// Per-edge distances: classified edges use their setback, the rest the side setback
fn edge_distances(request: &BuildableAreaRequest, vertex_count: usize) -> Vec<f64> {
    let mut distances = vec![request.requirements.side_setback; vertex_count];
    for classification in &request.edge_classifications {
        if let Some(distance) = distances.get_mut(classification.index) {
            *distance = classification.setback;
        }
    }
    distances
}

#[async_trait]
impl BuildableAreaService for LocalBuildableAreaService {
    async fn calculate(&self, request: &BuildableAreaRequest) -> Result<BuildableAreaResponse> {
        let site = Ring::new(request.site_coords.clone());
        ensure_valid_ring(&site, RingCheck::Open)?;

        let site_area_m2 = polygon_area_m2(&site);
        let distances = edge_distances(request, site.vertex_count());
        let Some(points) = offset_ring_inward(&site, &distances) else {
            debug!(?distances, "Setbacks consume the whole site");
            return Ok(BuildableAreaResponse {
                site_area_m2,
                calculation_method: LOCAL_METHOD.to_string(),
                error: Some("Setbacks leave no buildable area".to_string()),
                ..Default::default()
            });
        };

        let buildable = Ring::new(points);
        let buildable_area_m2 = polygon_area_m2(&buildable);
        let coords = serde_json::to_value(buildable.to_positions())
            .map_err(|e| SiteError::Serialization(e.to_string()))?;

        Ok(BuildableAreaResponse {
            buildable_coords: coords,
            buildable_area_m2,
            site_area_m2,
            coverage_ratio: if site_area_m2 > 0.0 { buildable_area_m2 / site_area_m2 } else { 0.0 },
            calculation_method: LOCAL_METHOD.to_string(),
            error: None,
        })
    }

    fn name(&self) -> &str {
        LOCAL_METHOD
    }
}
