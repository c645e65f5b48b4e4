//! Device profile and application configuration.

use crate::protocol::StartStopOpcodes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric units (km/h, km)
    #[default]
    Metric,
    /// Imperial units (mph, miles)
    Imperial,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Metric => write!(f, "Metric"),
            Units::Imperial => write!(f, "Imperial"),
        }
    }
}

impl Units {
    /// Convert a speed to the preferred units.
    pub fn convert_speed(&self, speed_kmh: f32) -> (f32, &'static str) {
        match self {
            Units::Metric => (speed_kmh, "km/h"),
            Units::Imperial => (speed_kmh * 0.621371, "mph"),
        }
    }

    /// Convert a distance to the preferred units.
    pub fn convert_distance(&self, distance_km: f32) -> (f32, &'static str) {
        match self {
            Units::Metric => (distance_km, "km"),
            Units::Imperial => (distance_km * 0.621371, "mi"),
        }
    }
}

/// Per-device tuning the protocol cannot discover on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Which start/stop byte pair this bike expects; the observed hardware
    /// disagrees, so there is no canonical value
    pub start_stop: StartStopOpcodes,
    /// Override the negotiated minimum resistance level
    pub min_resistance: Option<i16>,
    /// Override the negotiated maximum resistance level
    pub max_resistance: Option<i16>,
    /// Minimum milliseconds between outbound commands
    pub command_interval_ms: u64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            start_stop: StartStopOpcodes::default(),
            min_resistance: None,
            max_resistance: None,
            command_interval_ms: 500,
        }
    }
}

impl DeviceProfile {
    /// The configured range override, when both bounds are set.
    pub fn range_override(&self) -> Option<(i16, i16)> {
        match (self.min_resistance, self.max_resistance) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Device-specific protocol tuning
    pub device: DeviceProfile,
    /// Scan timeout in seconds
    pub scan_timeout_secs: u64,
    /// Unit preference for display
    pub units: Units,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceProfile::default(),
            scan_timeout_secs: 30,
            units: Units::default(),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "bikelink", "BikeLink")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the platform config path. A missing file yields
/// the defaults.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|error| ConfigError::IoError(error.to_string()))?;

    toml::from_str(&content).map_err(|error| ConfigError::ParseError(error.to_string()))
}

/// Save configuration to the platform config path.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&get_config_path(), config)
}

/// Save configuration to an explicit path.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| ConfigError::IoError(error.to_string()))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|error| ConfigError::SerializeError(error.to_string()))?;

    std::fs::write(path, content).map_err(|error| ConfigError::IoError(error.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
