//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use siteinspect_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "siteinspect.toml";

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            path.exists().then_some(path)
        }
    }
}

/// Build the layered configuration: defaults, file, environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }
    let mut config = config.load_from_env();

    config.update_from_cli(CliConfigOverrides {
        request_timeout_secs: cli.timeout,
        api_base_url: cli.api_url.clone(),
        ..Default::default()
    });
    Ok(config)
}
