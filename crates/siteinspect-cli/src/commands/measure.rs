//! Measure command implementation

use crate::cli::MeasureArgs;
use crate::input::read_boundary;
use crate::output::OutputWriter;
use crate::output_types::{EdgeInfo, EdgeRow, MeasureOutput};
use anyhow::Result;
use siteinspect_core::config::LayeredConfig;
use siteinspect_core::models::area_text;
use siteinspect_geo::{centroid, distance_meters, merge_collinear_ring};
use siteinspect_workflow::build_boundary;

pub fn execute(args: MeasureArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut ring = read_boundary(&args.file)?.closed();
    let mut merged = 0;
    if args.merge {
        let before = ring.vertex_count();
        ring = merge_collinear_ring(&ring, config.collinear_tolerance.value);
        merged = before.saturating_sub(ring.vertex_count());
        tracing::debug!(before, after = ring.vertex_count(), "Merged collinear vertices");
    }

    let boundary = build_boundary(ring, None)?;
    let edges: Vec<EdgeInfo> = boundary
        .edges
        .iter()
        .map(|edge| EdgeInfo {
            index: edge.index,
            start: edge.start,
            end: edge.end,
            length_m: distance_meters(&edge.start, &edge.end),
        })
        .collect();

    let measured = MeasureOutput {
        vertex_count: boundary.ring.vertex_count(),
        area_m2: boundary.area_m2,
        area_text: area_text(boundary.area_m2),
        perimeter_m: boundary.perimeter_m,
        centroid: centroid(&boundary.ring),
        edges,
    };

    if output.is_json() {
        return output.result(measured);
    }

    if merged > 0 {
        output.info(format!("Merged {} collinear vertices", merged));
    }
    if measured.area_m2 <= 0.0 {
        output.warning("Boundary has zero area");
    }

    output.section("Site Boundary");
    output.kv("Vertices", measured.vertex_count);
    output.kv("Area", &measured.area_text);
    output.kv("Perimeter", format!("{:.1} m", measured.perimeter_m));
    if let Some(center) = measured.centroid {
        output.kv("Centroid", format!("{:.6}, {:.6}", center.lng, center.lat));
    }

    output.section("Edges");
    output.table(measured.edges.iter().map(EdgeRow::from).collect());
    Ok(())
}
