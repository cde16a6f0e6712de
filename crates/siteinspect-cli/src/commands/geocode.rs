//! Geocode command implementation

use crate::cli::GeocodeArgs;
use crate::output::OutputWriter;
use crate::output_types::GeocodeOutput;
use anyhow::Result;
use siteinspect_core::config::LayeredConfig;
use siteinspect_core::ports::Geocoder;
use siteinspect_store::{HttpGeocoder, HttpSettings};

pub async fn execute(args: GeocodeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let geocoder = HttpGeocoder::new(HttpSettings::from_config(config));
    let result = geocoder.geocode(&args.query).await?;
    let point = result.point();

    if output.is_json() {
        return output.result(GeocodeOutput {
            query: args.query,
            display_name: result.display_name,
            lng: point.lng,
            lat: point.lat,
        });
    }

    output.success(format!("Found location for '{}'", args.query));
    if !result.display_name.is_empty() {
        output.kv("Name", &result.display_name);
    }
    output.kv("Longitude", format!("{:.6}", point.lng));
    output.kv("Latitude", format!("{:.6}", point.lat));
    Ok(())
}
