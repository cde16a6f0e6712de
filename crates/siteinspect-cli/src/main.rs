//! SiteInspect CLI - Command-line interface
//!
//! Measures site boundaries and derives buildable areas through the workflow engine.

mod cli;
mod commands;
mod config_loader;
mod input;
mod output;
mod output_types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(err) = runtime.block_on(commands::execute(cli)) {
        output::OutputWriter::new(json).error(format!("{:#}", err));
        std::process::exit(1);
    }

    Ok(())
}
