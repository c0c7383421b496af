//! Configuration parsing and validation for fxsession
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Standard and daylight session tables (main windows, overlaps, killzones)
//! - Engine settings (observer offset, DST detection, warning thresholds)
//! - The half-hourly volume curve
//! - Validation with clear error messages
//!
//! Anything a config file leaves out (tables, volume curve) is taken from
//! the built-in defaults in `default.toml`.

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use fxsession_api::VolumeCurveError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),

    #[error("No session tables configured")]
    MissingTables,

    #[error("No volume curve configured")]
    MissingVolume,

    #[error("Invalid volume curve: {0}")]
    Volume(#[from] VolumeCurveError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Built-in configuration: the four major sessions with overlaps and
/// killzones for both tables, plus a typical intraday volume profile.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let mut raw: RawConfig = toml::from_str(content)?;

    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    // Fill tables and volume from the built-in config
    if raw.tables.is_none() || raw.volume.is_none() {
        let defaults: RawConfig = toml::from_str(DEFAULT_CONFIG)?;
        if raw.tables.is_none() {
            debug!("Using built-in session tables");
            raw.tables = defaults.tables;
        }
        if raw.volume.is_none() {
            debug!("Using built-in volume curve");
            raw.volume = defaults.volume;
        }
    }

    // Validate
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    // Convert to policy
    Policy::from_raw(raw)
}

/// The built-in policy, used when no config file exists
pub fn default_policy() -> ConfigResult<Policy> {
    parse_config(DEFAULT_CONFIG)
}
