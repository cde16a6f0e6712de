use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SiteInspect - Site boundaries, setbacks and buildable area
#[derive(Parser, Debug)]
#[command(name = "siteinspect")]
#[command(about = "Measure site boundaries and derive buildable areas from setbacks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./siteinspect.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the site API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Timeout for network calls, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure area, perimeter and edges of a boundary file
    Measure(MeasureArgs),

    /// Compute the terrain bounding box around a boundary
    Bounds(BoundsArgs),

    /// Derive the buildable area from front, back and side setbacks
    Setbacks(SetbacksArgs),

    /// Look up the coordinates of an address
    Geocode(GeocodeArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct MeasureArgs {
    /// GeoJSON or coordinate-array file holding the boundary
    pub file: PathBuf,

    /// Merge near-collinear vertices before listing edges
    #[arg(long)]
    pub merge: bool,
}

#[derive(Parser, Debug)]
pub struct BoundsArgs {
    /// GeoJSON or coordinate-array file holding the boundary
    pub file: PathBuf,

    /// Buffer around the boundary in meters
    #[arg(long, value_name = "METERS")]
    pub buffer: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct SetbacksArgs {
    /// GeoJSON or coordinate-array file holding the boundary
    pub file: PathBuf,

    /// Front setback in meters
    #[arg(long, default_value = "0")]
    pub front: String,

    /// Back setback in meters
    #[arg(long, default_value = "0")]
    pub back: String,

    /// Side setback in meters
    #[arg(long, default_value = "0")]
    pub side: String,

    /// Index of the front edge
    #[arg(long)]
    pub front_edge: usize,

    /// Index of the back edge
    #[arg(long)]
    pub back_edge: usize,

    /// Use the remote buildable-area service instead of the local offset
    #[arg(long)]
    pub remote: bool,

    /// Print the buildable area as GeoJSON
    #[arg(long)]
    pub geojson: bool,
}

#[derive(Parser, Debug)]
pub struct GeocodeArgs {
    /// Address or place name
    pub query: String,
}
