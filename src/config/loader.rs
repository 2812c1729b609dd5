//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and read
//! 2. YAML parsing into [`SimulationConfig`]
//! 3. Validation (ranges, limits) producing errors or warnings

use std::path::Path;
use std::time::Duration;

use crate::config::schema::SimulationConfig;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Limits guarding against unreasonable configurations.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum number of vehicles.
    pub max_vehicles: usize,

    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_vehicles: env_or("TRAFFICLIGHT_MAX_VEHICLES", 256),
            max_config_size: env_or("TRAFFICLIGHT_MAX_CONFIG_SIZE", 64 * 1024),
        }
    }
}

/// Dwell bounds below this produce a warning.
const SHORT_DWELL: Duration = Duration::from_millis(100);

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: SimulationConfig,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "warning: {} at {location}", self.message),
            None => write!(f, "warning: {}", self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
}

impl ConfigLoader {
    /// Creates a loader with the given limits.
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Creates a loader with default limits.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ConfigLimits::default())
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file is empty or too large
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.limits.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.limits.max_config_size),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        self.load_str(raw, path)
    }

    /// Parses and validates configuration text; `path` is used for messages only.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` for empty or malformed YAML and
    /// `ConfigError::InvalidValue` for validation failures.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let config: SimulationConfig =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        let warnings = self.validate(&config)?;
        Ok(LoadResult { config, warnings })
    }

    /// Validates a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first invalid field.
    pub fn validate(&self, config: &SimulationConfig) -> Result<Vec<LoadWarning>, ConfigError> {
        config.cycler_config()?;
        config.vehicle_config(0)?;

        if config.vehicles.count > self.limits.max_vehicles {
            return Err(ConfigError::InvalidValue {
                field: "vehicles.count".to_string(),
                value: config.vehicles.count.to_string(),
                expected: format!("at most {}", self.limits.max_vehicles),
            });
        }

        let mut warnings = Vec::new();
        if config.light.min_dwell < SHORT_DWELL {
            warnings.push(LoadWarning {
                message: format!(
                    "dwell shorter than {} makes phases hard to observe",
                    humantime::format_duration(SHORT_DWELL)
                ),
                location: Some("light.min_dwell".to_string()),
            });
        }
        if config.vehicles.count == 0 && config.vehicles.seed.is_some() {
            warnings.push(LoadWarning {
                message: "seed has no effect without vehicles".to_string(),
                location: Some("vehicles.seed".to_string()),
            });
        }
        Ok(warnings)
    }
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
