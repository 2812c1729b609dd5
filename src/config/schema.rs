//! Configuration schema
//!
//! Typed representation of the YAML configuration file. Every field is
//! optional; missing fields take the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::phase::{CyclerConfig, DEFAULT_MAX_DWELL, DEFAULT_MIN_DWELL, DwellRange};
use crate::sim::VehicleConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Traffic light settings
    pub light: LightConfig,
    /// Vehicle settings
    pub vehicles: VehiclesConfig,
}

impl SimulationConfig {
    /// Builds the cycler settings for the light.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the dwell bounds are unusable.
    pub fn cycler_config(&self) -> Result<CyclerConfig, ConfigError> {
        let dwell = range(
            "light.min_dwell",
            self.light.min_dwell,
            self.light.max_dwell,
        )?;
        Ok(CyclerConfig {
            dwell,
            seed: self.light.seed,
        })
    }

    /// Builds the settings for vehicle number `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the travel bounds are unusable.
    pub fn vehicle_config(&self, index: usize) -> Result<VehicleConfig, ConfigError> {
        let travel = range(
            "vehicles.min_travel",
            self.vehicles.min_travel,
            self.vehicles.max_travel,
        )?;
        let offset = u64::try_from(index).unwrap_or(u64::MAX);
        Ok(VehicleConfig {
            travel,
            seed: self.vehicles.seed.map(|s| s.wrapping_add(offset)),
        })
    }
}

fn range(field: &str, min: Duration, max: Duration) -> Result<DwellRange, ConfigError> {
    DwellRange::new(min, max).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        value: format!(
            "{}..={}",
            humantime::format_duration(min),
            humantime::format_duration(max)
        ),
        expected: e.to_string(),
    })
}

/// Traffic light settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    /// Lower dwell bound
    #[serde(with = "humantime_str")]
    pub min_dwell: Duration,
    /// Upper dwell bound
    #[serde(with = "humantime_str")]
    pub max_dwell: Duration,
    /// Fixed RNG seed for reproducible dwell sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            min_dwell: DEFAULT_MIN_DWELL,
            max_dwell: DEFAULT_MAX_DWELL,
            seed: None,
        }
    }
}

/// Vehicle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehiclesConfig {
    /// Number of vehicles approaching the light
    pub count: usize,
    /// Lower bound on time between arrivals
    #[serde(with = "humantime_str")]
    pub min_travel: Duration,
    /// Upper bound on time between arrivals
    #[serde(with = "humantime_str")]
    pub max_travel: Duration,
    /// Base seed; vehicle `n` uses `seed + n`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for VehiclesConfig {
    fn default() -> Self {
        Self {
            count: 0,
            min_travel: Duration::from_millis(500),
            max_travel: Duration::from_secs(2),
            seed: None,
        }
    }
}

/// Serde adapter storing durations as humantime strings (`"4s"`, `"250ms"`).
mod humantime_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(s.trim()).map_err(de::Error::custom)
    }
}
