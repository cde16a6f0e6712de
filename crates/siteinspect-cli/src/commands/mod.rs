//! Command implementations

mod bounds;
mod config;
mod geocode;
mod measure;
mod setbacks;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Measure(args) => measure::execute(args, &config, &output),
        Commands::Bounds(args) => bounds::execute(args, &config, &output),
        Commands::Setbacks(args) => setbacks::execute(args, &config, &output).await,
        Commands::Geocode(args) => geocode::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}
