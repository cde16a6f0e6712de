//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use siteinspect_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use siteinspect_core::SiteError;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "SITEINSPECT_DEBOUNCE_MS",
        "SITEINSPECT_REQUEST_TIMEOUT_SECS",
        "SITEINSPECT_GEOCODE_TIMEOUT_SECS",
        "SITEINSPECT_READ_RETRIES",
        "SITEINSPECT_COLLINEAR_TOLERANCE",
        "SITEINSPECT_TERRAIN_BUFFER_M",
        "SITEINSPECT_API_BASE_URL",
    ] {
        env::remove_var(key);
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", contents).unwrap();
    file
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = config_file("debounce_ms = 150\nterrain_buffer_m = 30.0");

    env::set_var("SITEINSPECT_DEBOUNCE_MS", "500");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.debounce_ms.value, 500);
    assert_eq!(config.debounce_ms.source, ConfigSource::Environment);
    assert_eq!(config.terrain_buffer_m.value, 30.0);
    assert_eq!(config.terrain_buffer_m.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("SITEINSPECT_READ_RETRIES", "many");
    env::set_var("SITEINSPECT_COLLINEAR_TOLERANCE", "-0.1");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.read_retries.value, 2);
    assert_eq!(config.read_retries.source, ConfigSource::Default);
    assert_eq!(config.collinear_tolerance.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    let file = config_file("api_base_url = \"http://file.example\"");
    env::set_var("SITEINSPECT_API_BASE_URL", "http://env.example");

    let mut config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();
    assert_eq!(config.api_base_url.value, "http://env.example");

    config.update_from_cli(CliConfigOverrides {
        api_base_url: Some("http://cli.example".to_string()),
        ..Default::default()
    });
    assert_eq!(config.api_base_url.value, "http://cli.example");
    assert_eq!(config.api_base_url.source, ConfigSource::Cli);

    clear_env();
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("debounce_ms = [not toml");
    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(matches!(result, Err(SiteError::ConfigInvalid { .. })));
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/siteinspect.toml");
    assert!(result.is_err());
}
