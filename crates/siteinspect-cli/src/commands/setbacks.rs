//! Setbacks command implementation
//!
//! Drives the full workflow headlessly: the boundary is drawn from the file,
//! the two edges are picked by index and the buildable area is confirmed.

use crate::cli::SetbacksArgs;
use crate::input::read_boundary;
use crate::output::OutputWriter;
use crate::output_types::{ClassificationRow, SetbacksOutput};
use anyhow::{bail, Result};
use siteinspect_core::config::LayeredConfig;
use siteinspect_core::models::{area_text, SetbackSpec};
use siteinspect_core::ports::BuildableAreaService;
use siteinspect_store::{HttpBuildableAreaService, HttpSettings, LocalBuildableAreaService};
use siteinspect_workflow::render::buildable_layer;
use siteinspect_workflow::{AddPointOutcome, EdgeTarget, SiteInspector, WorkflowSettings};
use std::sync::Arc;
use tracing::debug;

fn buildable_service(remote: bool, config: &LayeredConfig) -> Arc<dyn BuildableAreaService> {
    if remote {
        Arc::new(HttpBuildableAreaService::new(HttpSettings::from_config(config)))
    } else {
        Arc::new(LocalBuildableAreaService::new())
    }
}

pub async fn execute(args: SetbacksArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    if args.front_edge == args.back_edge {
        bail!("Front and back edge must differ (both are {})", args.front_edge);
    }

    let ring = read_boundary(&args.file)?;
    let service = buildable_service(args.remote, config);
    let service_name = service.name().to_string();
    let mut inspector =
        SiteInspector::new(WorkflowSettings::from(config)).with_buildable_service(service);

    inspector.start_boundary();
    for point in ring.vertices() {
        if let AddPointOutcome::Duplicate = inspector.add_boundary_point(*point)? {
            debug!(lng = point.lng, lat = point.lat, "Skipped repeated vertex");
        }
    }
    let boundary = inspector.finish_boundary().await?;

    let edge_count = boundary.edges.len();
    for index in [args.front_edge, args.back_edge] {
        if index >= edge_count {
            bail!("Edge {} does not exist; the boundary has edges 0 to {}", index, edge_count - 1);
        }
    }

    inspector.enter_edge_selection()?;
    inspector.select_edge(EdgeTarget::Index(args.front_edge))?;
    inspector.select_edge(EdgeTarget::Index(args.back_edge))?;
    let classifications = inspector.set_setbacks(SetbackSpec::from_inputs(
        Some(args.front.as_str()),
        Some(args.back.as_str()),
        Some(args.side.as_str()),
    ))?;
    let area = inspector.confirm_setbacks().await?;

    if args.geojson {
        return output.data(&buildable_layer(&area));
    }

    if output.is_json() {
        return output.result(SetbacksOutput {
            service: service_name,
            site_area_m2: boundary.area_m2,
            buildable_area_m2: area.area_m2,
            coverage_ratio: area.coverage_ratio,
            calculation_method: area.calculation_method,
            edge_classifications: classifications,
            buildable_coords: area.ring.to_positions(),
        });
    }

    output.success(format!("Buildable area computed with the {} service", service_name));
    output.kv("Site area", area_text(boundary.area_m2));
    output.kv("Buildable area", area_text(area.area_m2));
    output.kv("Coverage", format!("{:.1}%", area.coverage_ratio * 100.0));
    output.kv("Method", &area.calculation_method);

    output.section("Edge Setbacks");
    output.table(classifications.iter().map(ClassificationRow::from).collect());
    Ok(())
}
