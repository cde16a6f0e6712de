//! Bounds command implementation

use crate::cli::BoundsArgs;
use crate::input::read_boundary;
use crate::output::OutputWriter;
use crate::output_types::BoundsOutput;
use anyhow::{Context, Result};
use siteinspect_core::config::{parse_buffer, LayeredConfig};
use siteinspect_geo::terrain_bounds;

pub fn execute(args: BoundsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let buffer_m = parse_buffer(args.buffer.unwrap_or(config.terrain_buffer_m.value))?;
    let ring = read_boundary(&args.file)?;
    let bounds = terrain_bounds(&ring, buffer_m).context("Boundary has no vertices")?;

    if output.is_json() {
        return output.result(BoundsOutput { buffer_m, bounds });
    }

    output.section(format!("Terrain Bounds ({} m buffer)", buffer_m));
    output.kv("Southwest", format!("{:.6}, {:.6}", bounds.southwest.lng, bounds.southwest.lat));
    output.kv("Northeast", format!("{:.6}, {:.6}", bounds.northeast.lng, bounds.northeast.lat));
    output.kv("Center", format!("{:.6}, {:.6}", bounds.center.lng, bounds.center.lat));
    output.kv("Size", format!("{:.6}° × {:.6}°", bounds.width, bounds.height));
    Ok(())
}
