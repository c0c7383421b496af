//! Validated policy structures

use crate::schema::{RawConfig, RawEngineConfig, RawSecondaryWindow, RawServiceConfig, RawSession, RawWindow};
use crate::validation::{parse_dst_override, parse_window_kind};
use crate::{ConfigError, ConfigResult};
use fxsession_api::{
    SecondaryWindow, SessionDefinition, SessionWindow, TableVariant, VolumeCurve, WindowKind,
};
use fxsession_util::{SessionName, data_dir_without_env};
use std::path::PathBuf;
use std::time::Duration;

/// Default open/close warning threshold
pub const DEFAULT_WARNING_MINUTES: f64 = 15.0;

/// Default lead time of the "before" alerts
pub const DEFAULT_ALERT_LEAD_MINUTES: u32 = 15;

/// Default alert firing tolerance
pub const DEFAULT_ALERT_TOLERANCE_MINUTES: f64 = 1.0;

/// Default period of the service's alert check
pub const DEFAULT_ALERT_INTERVAL_SECONDS: u64 = 10;

/// Validated policy ready for use by the engine
#[derive(Debug, Clone)]
pub struct Policy {
    /// Service configuration
    pub service: ServiceConfig,

    /// Engine settings
    pub engine: EngineSettings,

    /// Standard and daylight session tables
    pub tables: SessionTables,

    /// Volume curve on the UTC axis
    pub volume: VolumeCurve,
}

impl Policy {
    /// Convert from raw config (after validation and default filling)
    pub fn from_raw(raw: RawConfig) -> ConfigResult<Self> {
        let tables = raw.tables.ok_or(ConfigError::MissingTables)?;
        let volume = match raw.volume {
            Some(volume) => {
                let slots = volume
                    .curve
                    .into_iter()
                    .map(|v| u8::try_from(v).unwrap_or(u8::MAX))
                    .collect();
                VolumeCurve::new(slots)?
            }
            None => return Err(ConfigError::MissingVolume),
        };

        Ok(Self {
            service: ServiceConfig::from_raw(raw.service),
            engine: EngineSettings::from_raw(raw.engine),
            tables: SessionTables {
                standard: tables.standard.into_iter().map(convert_session).collect(),
                daylight: tables.daylight.into_iter().map(convert_session).collect(),
            },
            volume,
        })
    }

    /// Number of sessions per table
    pub fn session_count(&self) -> usize {
        self.tables.standard.len()
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub snapshot_interval: Duration,
    pub alert_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
            snapshot_interval: raw
                .snapshot_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.snapshot_interval),
            alert_interval: raw
                .alert_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.alert_interval),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: data_dir_without_env(),
            snapshot_interval: Duration::from_secs(1),
            alert_interval: Duration::from_secs(DEFAULT_ALERT_INTERVAL_SECONDS),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Observer offset from UTC in decimal hours
    pub observer_offset_hours: f64,
    /// Follow the US/Europe DST calendars when no override is set
    pub auto_detect_dst: bool,
    /// `Some(true)` forces the daylight table, `Some(false)` the standard one
    pub dst_override: Option<bool>,
    pub warning_threshold_hours: f64,
    pub alert_lead_minutes: u32,
    pub alert_tolerance_hours: f64,
}

impl EngineSettings {
    fn from_raw(raw: RawEngineConfig) -> Self {
        Self {
            observer_offset_hours: raw.observer_offset_hours.unwrap_or(0.0),
            auto_detect_dst: raw.auto_detect_dst.unwrap_or(true),
            dst_override: raw.dst_override.as_deref().and_then(parse_dst_override),
            warning_threshold_hours: raw.warning_minutes.unwrap_or(DEFAULT_WARNING_MINUTES) / 60.0,
            alert_lead_minutes: raw.alert_lead_minutes.unwrap_or(DEFAULT_ALERT_LEAD_MINUTES),
            alert_tolerance_hours: raw
                .alert_tolerance_minutes
                .unwrap_or(DEFAULT_ALERT_TOLERANCE_MINUTES)
                / 60.0,
        }
    }

    pub fn alert_lead_hours(&self) -> f64 {
        self.alert_lead_minutes as f64 / 60.0
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_raw(RawEngineConfig::default())
    }
}

/// The two static session tables
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTables {
    pub standard: Vec<SessionDefinition>,
    pub daylight: Vec<SessionDefinition>,
}

impl SessionTables {
    pub fn get(&self, variant: TableVariant) -> &[SessionDefinition] {
        match variant {
            TableVariant::Standard => &self.standard,
            TableVariant::Daylight => &self.daylight,
        }
    }
}

// Conversion helpers

fn convert_window(raw: RawWindow) -> SessionWindow {
    SessionWindow {
        start: raw.start,
        end: raw.end,
        label: raw.label,
        color: raw.color,
        tooltip: raw.tooltip,
    }
}

fn convert_secondary(raw: RawSecondaryWindow) -> SecondaryWindow {
    SecondaryWindow {
        kind: parse_window_kind(&raw.kind).unwrap_or(WindowKind::Overlap),
        role: raw.role,
        window: SessionWindow {
            start: raw.start,
            end: raw.end,
            label: raw.label,
            color: raw.color,
            tooltip: raw.tooltip,
        },
    }
}

fn convert_session(raw: RawSession) -> SessionDefinition {
    SessionDefinition {
        name: SessionName::new(raw.name),
        main: convert_window(raw.main),
        secondary: raw.windows.into_iter().map(convert_secondary).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.observer_offset_hours, 0.0);
        assert!(settings.auto_detect_dst);
        assert_eq!(settings.dst_override, None);
        assert_eq!(settings.warning_threshold_hours, 0.25);
        assert_eq!(settings.alert_lead_hours(), 0.25);
        assert!((settings.alert_tolerance_hours - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_engine_overrides() {
        let settings = EngineSettings::from_raw(RawEngineConfig {
            observer_offset_hours: Some(9.5),
            auto_detect_dst: Some(false),
            dst_override: Some("daylight".into()),
            warning_minutes: Some(30.0),
            alert_lead_minutes: Some(5),
            alert_tolerance_minutes: Some(2.0),
        });
        assert_eq!(settings.observer_offset_hours, 9.5);
        assert!(!settings.auto_detect_dst);
        assert_eq!(settings.dst_override, Some(true));
        assert_eq!(settings.warning_threshold_hours, 0.5);
        assert_eq!(settings.alert_lead_minutes, 5);
    }

    #[test]
    fn test_service_defaults() {
        let service = ServiceConfig::from_raw(RawServiceConfig {
            data_dir: Some(PathBuf::from("/var/lib/fxsession")),
            snapshot_interval_seconds: None,
            alert_interval_seconds: Some(30),
        });
        assert_eq!(service.data_dir, PathBuf::from("/var/lib/fxsession"));
        assert_eq!(service.snapshot_interval, Duration::from_secs(1));
        assert_eq!(service.alert_interval, Duration::from_secs(30));
    }
}
