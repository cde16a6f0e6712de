use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Default debounce before a preview recompute is issued
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default bound on generic network calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Default bound on geocoding calls
pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 15;
/// Default retry count for idempotent reads
pub const DEFAULT_READ_RETRIES: u32 = 2;

/// Layered configuration for SiteInspect
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub debounce_ms: ConfigValue<u64>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub geocode_timeout_secs: ConfigValue<u64>,
    pub read_retries: ConfigValue<u32>,
    pub retry_backoff_ms: ConfigValue<u64>,
    pub collinear_tolerance: ConfigValue<f64>,
    pub terrain_buffer_m: ConfigValue<f64>,
    pub api_base_url: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            debounce_ms: ConfigValue::new(DEFAULT_DEBOUNCE_MS, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(
                DEFAULT_REQUEST_TIMEOUT_SECS,
                ConfigSource::Default,
            ),
            geocode_timeout_secs: ConfigValue::new(
                DEFAULT_GEOCODE_TIMEOUT_SECS,
                ConfigSource::Default,
            ),
            read_retries: ConfigValue::new(DEFAULT_READ_RETRIES, ConfigSource::Default),
            retry_backoff_ms: ConfigValue::new(500, ConfigSource::Default),
            collinear_tolerance: ConfigValue::new(1e-4, ConfigSource::Default),
            terrain_buffer_m: ConfigValue::new(50.0, ConfigSource::Default),
            api_base_url: ConfigValue::new(
                "http://localhost:5000".to_string(),
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SiteError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SiteError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(v) = file_config.debounce_ms {
            self.debounce_ms.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.geocode_timeout_secs {
            self.geocode_timeout_secs.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.read_retries {
            self.read_retries.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.retry_backoff_ms {
            self.retry_backoff_ms.update(v, ConfigSource::File);
        }
        if let Some(v) = file_config.collinear_tolerance {
            self.collinear_tolerance.update(parse_tolerance(v)?, ConfigSource::File);
        }
        if let Some(v) = file_config.terrain_buffer_m {
            self.terrain_buffer_m.update(parse_buffer(v)?, ConfigSource::File);
        }
        if let Some(v) = file_config.api_base_url {
            self.api_base_url.update(v, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Some(v) = env_value::<u64>("SITEINSPECT_DEBOUNCE_MS") {
            self.debounce_ms.update(v, ConfigSource::Environment);
        }
        if let Some(v) = env_value::<u64>("SITEINSPECT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs.update(v, ConfigSource::Environment);
        }
        if let Some(v) = env_value::<u64>("SITEINSPECT_GEOCODE_TIMEOUT_SECS") {
            self.geocode_timeout_secs.update(v, ConfigSource::Environment);
        }
        if let Some(v) = env_value::<u32>("SITEINSPECT_READ_RETRIES") {
            self.read_retries.update(v, ConfigSource::Environment);
        }
        if let Some(v) = env_value::<f64>("SITEINSPECT_COLLINEAR_TOLERANCE") {
            match parse_tolerance(v) {
                Ok(v) => self.collinear_tolerance.update(v, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SITEINSPECT_COLLINEAR_TOLERANCE: {}", e),
            }
        }
        if let Some(v) = env_value::<f64>("SITEINSPECT_TERRAIN_BUFFER_M") {
            match parse_buffer(v) {
                Ok(v) => self.terrain_buffer_m.update(v, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SITEINSPECT_TERRAIN_BUFFER_M: {}", e),
            }
        }
        if let Ok(url) = env::var("SITEINSPECT_API_BASE_URL") {
            self.api_base_url.update(url, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(v) = overrides.debounce_ms {
            self.debounce_ms.update(v, ConfigSource::Cli);
        }
        if let Some(v) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(v, ConfigSource::Cli);
        }
        if let Some(v) = overrides.terrain_buffer_m {
            self.terrain_buffer_m.update(v, ConfigSource::Cli);
        }
        if let Some(v) = overrides.api_base_url {
            self.api_base_url.update(v, ConfigSource::Cli);
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.value)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs.value)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "debounce_ms".to_string(),
            (self.debounce_ms.value.to_string(), self.debounce_ms.source),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );
        map.insert(
            "geocode_timeout_secs".to_string(),
            (self.geocode_timeout_secs.value.to_string(), self.geocode_timeout_secs.source),
        );
        map.insert(
            "read_retries".to_string(),
            (self.read_retries.value.to_string(), self.read_retries.source),
        );
        map.insert(
            "retry_backoff_ms".to_string(),
            (self.retry_backoff_ms.value.to_string(), self.retry_backoff_ms.source),
        );
        map.insert(
            "collinear_tolerance".to_string(),
            (self.collinear_tolerance.value.to_string(), self.collinear_tolerance.source),
        );
        map.insert(
            "terrain_buffer_m".to_string(),
            (format!("{} m", self.terrain_buffer_m.value), self.terrain_buffer_m.source),
        );
        map.insert(
            "api_base_url".to_string(),
            (self.api_base_url.value.clone(), self.api_base_url.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    geocode_timeout_secs: Option<u64>,
    read_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    collinear_tolerance: Option<f64>,
    terrain_buffer_m: Option<f64>,
    api_base_url: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub debounce_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub terrain_buffer_m: Option<f64>,
    pub api_base_url: Option<String>,
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected a number", key, raw);
            None
        }
    }
}

/// Validate a collinearity tolerance
pub fn parse_tolerance(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SiteError::ConfigInvalid {
            key: "collinear_tolerance".to_string(),
            reason: format!("Tolerance must be a positive number, got {}", value),
        })
    }
}

/// Validate a terrain buffer distance
pub fn parse_buffer(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SiteError::ConfigInvalid {
            key: "terrain_buffer_m".to_string(),
            reason: format!("Buffer must be zero or a positive distance in meters, got {}", value),
        })
    }
}
