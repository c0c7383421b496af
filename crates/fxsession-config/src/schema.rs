//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: RawEngineConfig,

    /// Half-hourly volume curve (built-in curve when absent)
    #[serde(default)]
    pub volume: Option<RawVolume>,

    /// Session tables (built-in tables when absent)
    #[serde(default)]
    pub tables: Option<RawTables>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// How often the snapshot is recomputed
    pub snapshot_interval_seconds: Option<u64>,

    /// How often alerts are checked
    pub alert_interval_seconds: Option<u64>,
}

/// Engine settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEngineConfig {
    /// Observer offset from UTC in decimal hours (5.5 for India)
    pub observer_offset_hours: Option<f64>,

    /// Pick the daylight table from the US/Europe DST calendars
    pub auto_detect_dst: Option<bool>,

    /// Force a table: "standard" or "daylight"
    pub dst_override: Option<String>,

    /// Open/close warning threshold
    pub warning_minutes: Option<f64>,

    /// Lead time of the "opens soon" / "closes soon" alerts
    pub alert_lead_minutes: Option<u32>,

    /// How far from its trigger an alert may still fire
    pub alert_tolerance_minutes: Option<f64>,
}

/// Volume curve
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVolume {
    /// 48 half-hour slots starting at 00:00 UTC, values 0-100
    pub curve: Vec<i64>,
}

/// The two static session tables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTables {
    pub standard: Vec<RawSession>,
    pub daylight: Vec<RawSession>,
}

/// Raw session definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSession {
    /// Unique session name
    pub name: String,

    /// Primary trading hours
    pub main: RawWindow,

    /// Overlaps and killzones
    #[serde(default)]
    pub windows: Vec<RawSecondaryWindow>,
}

/// A window in UTC hours. `end` may exceed 24 for windows crossing midnight.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawWindow {
    pub start: f64,
    pub end: f64,
    pub label: Option<String>,
    pub color: Option<String>,
    pub tooltip: Option<String>,
}

/// Secondary window with its role
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSecondaryWindow {
    /// Role key, unique within the session (e.g. "killzoneAM")
    pub role: String,

    /// "overlap" or "killzone"
    pub kind: String,

    pub start: f64,
    pub end: f64,
    pub label: Option<String>,
    pub color: Option<String>,
    pub tooltip: Option<String>,
}
