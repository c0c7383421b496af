//! Configuration validation

use crate::policy::{DEFAULT_ALERT_INTERVAL_SECONDS, DEFAULT_ALERT_TOLERANCE_MINUTES};
use crate::schema::{RawConfig, RawEngineConfig, RawSession, RawTables};
use fxsession_api::{MAX_VOLUME, MAIN_ROLE, VOLUME_SLOTS, WindowKind};
use fxsession_util::validate_offset;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Latest hour a window bound may reach (end of the following UTC day)
pub const MAX_WINDOW_HOUR: f64 = 48.0;

/// Validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{table} table, session '{session}', window '{role}': {message}")]
    WindowError {
        table: String,
        session: String,
        role: String,
        message: String,
    },

    #[error("Duplicate session '{session}' in {table} table")]
    DuplicateSession { table: String, session: String },

    #[error("Duplicate window role '{role}' in session '{session}' ({table} table)")]
    DuplicateRole {
        table: String,
        session: String,
        role: String,
    },

    #[error("{0} table has no sessions")]
    EmptyTable(String),

    #[error("Standard and daylight tables disagree: {0}")]
    TableMismatch(String),

    #[error("Volume curve: {0}")]
    VolumeError(String),

    #[error("Setting '{setting}': {message}")]
    SettingError { setting: String, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_engine(&config.engine));

    if let Some(secs) = config.service.snapshot_interval_seconds
        && secs == 0
    {
        errors.push(setting_error("service.snapshot_interval_seconds", "must be positive"));
    }
    if let Some(secs) = config.service.alert_interval_seconds
        && secs == 0
    {
        errors.push(setting_error("service.alert_interval_seconds", "must be positive"));
    }
    errors.extend(validate_alert_cadence(config));

    if let Some(volume) = &config.volume {
        if volume.curve.len() != VOLUME_SLOTS {
            errors.push(ValidationError::VolumeError(format!(
                "expected {} slots, got {}",
                VOLUME_SLOTS,
                volume.curve.len()
            )));
        }
        for (slot, value) in volume.curve.iter().enumerate() {
            if !(0..=MAX_VOLUME as i64).contains(value) {
                errors.push(ValidationError::VolumeError(format!(
                    "slot {} has value {}, expected 0-{}",
                    slot, value, MAX_VOLUME
                )));
            }
        }
    }

    if let Some(tables) = &config.tables {
        errors.extend(validate_tables(tables));
    }

    errors
}

fn setting_error(setting: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::SettingError {
        setting: setting.to_string(),
        message: message.into(),
    }
}

/// Alerts fire only on a check that lands within the tolerance of the
/// trigger, so consecutive checks may be at most two tolerances apart.
fn validate_alert_cadence(config: &RawConfig) -> Option<ValidationError> {
    let interval_secs = config
        .service
        .alert_interval_seconds
        .unwrap_or(DEFAULT_ALERT_INTERVAL_SECONDS);
    let tolerance_minutes = config
        .engine
        .alert_tolerance_minutes
        .unwrap_or(DEFAULT_ALERT_TOLERANCE_MINUTES);
    if interval_secs == 0 || !tolerance_minutes.is_finite() || tolerance_minutes <= 0.0 {
        // Reported by the individual setting checks
        return None;
    }

    let max_interval_secs = 2.0 * tolerance_minutes * 60.0;
    if interval_secs as f64 > max_interval_secs {
        return Some(setting_error(
            "service.alert_interval_seconds",
            format!(
                "{}s between alert checks can skip alerts; must be at most {}s \
                 (twice engine.alert_tolerance_minutes)",
                interval_secs, max_interval_secs
            ),
        ));
    }
    None
}

fn validate_engine(engine: &RawEngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(offset) = engine.observer_offset_hours
        && let Err(e) = validate_offset(offset)
    {
        errors.push(setting_error("engine.observer_offset_hours", e.to_string()));
    }

    if let Some(mode) = &engine.dst_override
        && parse_dst_override(mode).is_none()
    {
        errors.push(setting_error(
            "engine.dst_override",
            format!("unknown table '{}', expected \"standard\" or \"daylight\"", mode),
        ));
    }

    if let Some(minutes) = engine.warning_minutes
        && !(minutes.is_finite() && minutes > 0.0 && minutes <= 12.0 * 60.0)
    {
        errors.push(setting_error("engine.warning_minutes", "must be between 0 and 720"));
    }

    if let Some(minutes) = engine.alert_lead_minutes
        && !(1..=720).contains(&minutes)
    {
        errors.push(setting_error("engine.alert_lead_minutes", "must be between 1 and 720"));
    }

    if let Some(minutes) = engine.alert_tolerance_minutes
        && !(minutes.is_finite() && minutes > 0.0 && minutes < 60.0)
    {
        errors.push(setting_error(
            "engine.alert_tolerance_minutes",
            "must be greater than 0 and less than 60",
        ));
    }

    errors
}

fn validate_tables(tables: &RawTables) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_table("standard", &tables.standard));
    errors.extend(validate_table("daylight", &tables.daylight));

    // Both tables must describe the same sessions and roles
    let standard = table_shape(&tables.standard);
    let daylight = table_shape(&tables.daylight);
    for (session, roles) in &standard {
        match daylight.iter().find(|(name, _)| name == session) {
            None => errors.push(ValidationError::TableMismatch(format!(
                "session '{}' missing from daylight table",
                session
            ))),
            Some((_, daylight_roles)) if daylight_roles != roles => {
                errors.push(ValidationError::TableMismatch(format!(
                    "session '{}' has roles {:?} in standard table but {:?} in daylight table",
                    session, roles, daylight_roles
                )))
            }
            Some(_) => {}
        }
    }
    for (session, _) in &daylight {
        if !standard.iter().any(|(name, _)| name == session) {
            errors.push(ValidationError::TableMismatch(format!(
                "session '{}' missing from standard table",
                session
            )));
        }
    }

    errors
}

fn table_shape(sessions: &[RawSession]) -> Vec<(&str, BTreeSet<&str>)> {
    sessions
        .iter()
        .map(|s| {
            let roles = s.windows.iter().map(|w| w.role.as_str()).collect();
            (s.name.as_str(), roles)
        })
        .collect()
}

fn validate_table(table: &str, sessions: &[RawSession]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if sessions.is_empty() {
        errors.push(ValidationError::EmptyTable(table.to_string()));
    }

    let mut seen_names = HashSet::new();
    for session in sessions {
        if !seen_names.insert(session.name.as_str()) {
            errors.push(ValidationError::DuplicateSession {
                table: table.to_string(),
                session: session.name.clone(),
            });
        }
        errors.extend(validate_session(table, session));
    }

    errors
}

fn validate_session(table: &str, session: &RawSession) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let window_error = |role: &str, message: String| ValidationError::WindowError {
        table: table.to_string(),
        session: session.name.clone(),
        role: role.to_string(),
        message,
    };

    if session.name.trim().is_empty() {
        errors.push(window_error(MAIN_ROLE, "session name cannot be empty".into()));
    }

    if let Err(message) = validate_window_bounds(session.main.start, session.main.end) {
        errors.push(window_error(MAIN_ROLE, message));
    }

    let mut seen_roles = HashSet::new();
    for window in &session.windows {
        if window.role.is_empty() || window.role == MAIN_ROLE {
            errors.push(window_error(
                &window.role,
                format!("role must be non-empty and not '{}'", MAIN_ROLE),
            ));
        }
        if !seen_roles.insert(window.role.as_str()) {
            errors.push(ValidationError::DuplicateRole {
                table: table.to_string(),
                session: session.name.clone(),
                role: window.role.clone(),
            });
        }
        if parse_window_kind(&window.kind).is_none() {
            errors.push(window_error(
                &window.role,
                format!("unknown kind '{}', expected \"overlap\" or \"killzone\"", window.kind),
            ));
        }
        if let Err(message) = validate_window_bounds(window.start, window.end) {
            errors.push(window_error(&window.role, message));
        }
    }

    errors
}

/// Check the `[start, end)` invariants of a window in UTC hours
pub fn validate_window_bounds(start: f64, end: f64) -> Result<(), String> {
    if !start.is_finite() || !end.is_finite() {
        return Err("bounds must be finite numbers".into());
    }
    if !(0.0..MAX_WINDOW_HOUR).contains(&start) {
        return Err(format!("start {} must be in [0, 48)", start));
    }
    if end <= start {
        return Err(format!("end {} must be after start {}", end, start));
    }
    if end > MAX_WINDOW_HOUR {
        return Err(format!("end {} must not exceed 48", end));
    }
    if end - start > 24.0 {
        return Err(format!("window {}-{} is longer than 24 hours", start, end));
    }
    Ok(())
}

/// Parse a secondary window kind
pub fn parse_window_kind(kind: &str) -> Option<WindowKind> {
    match kind.to_lowercase().as_str() {
        "overlap" => Some(WindowKind::Overlap),
        "killzone" => Some(WindowKind::Killzone),
        _ => None,
    }
}

/// Parse a DST override: `Some(true)` forces the daylight table
pub fn parse_dst_override(mode: &str) -> Option<bool> {
    match mode.to_lowercase().as_str() {
        "daylight" | "dst" | "summer" => Some(true),
        "standard" | "winter" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawSecondaryWindow, RawVolume, RawWindow};

    fn window(start: f64, end: f64) -> RawWindow {
        RawWindow {
            start,
            end,
            label: None,
            color: None,
            tooltip: None,
        }
    }

    fn secondary(role: &str, kind: &str, start: f64, end: f64) -> RawSecondaryWindow {
        RawSecondaryWindow {
            role: role.into(),
            kind: kind.into(),
            start,
            end,
            label: None,
            color: None,
            tooltip: None,
        }
    }

    fn session(name: &str, start: f64, end: f64, windows: Vec<RawSecondaryWindow>) -> RawSession {
        RawSession {
            name: name.into(),
            main: window(start, end),
            windows,
        }
    }

    fn config_with(standard: Vec<RawSession>, daylight: Vec<RawSession>) -> RawConfig {
        RawConfig {
            config_version: 1,
            service: Default::default(),
            engine: Default::default(),
            volume: None,
            tables: Some(RawTables { standard, daylight }),
        }
    }

    #[test]
    fn test_window_bounds() {
        assert!(validate_window_bounds(8.0, 17.0).is_ok());
        assert!(validate_window_bounds(21.0, 30.0).is_ok());
        assert!(validate_window_bounds(30.0, 48.0).is_ok());

        assert!(validate_window_bounds(17.0, 8.0).is_err());
        assert!(validate_window_bounds(8.0, 8.0).is_err());
        assert!(validate_window_bounds(-1.0, 5.0).is_err());
        assert!(validate_window_bounds(40.0, 49.0).is_err());
        assert!(validate_window_bounds(48.0, 50.0).is_err());
        assert!(validate_window_bounds(f64::NAN, 5.0).is_err());
        assert!(validate_window_bounds(1.0, 26.0).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_window_kind("overlap"), Some(WindowKind::Overlap));
        assert_eq!(parse_window_kind("Killzone"), Some(WindowKind::Killzone));
        assert_eq!(parse_window_kind("main"), None);

        assert_eq!(parse_dst_override("daylight"), Some(true));
        assert_eq!(parse_dst_override("STANDARD"), Some(false));
        assert_eq!(parse_dst_override("auto"), None);
    }

    #[test]
    fn test_valid_tables() {
        let config = config_with(
            vec![session("London", 8.0, 17.0, vec![secondary("killzone", "killzone", 7.0, 10.0)])],
            vec![session("London", 7.0, 16.0, vec![secondary("killzone", "killzone", 6.0, 9.0)])],
        );
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let config = config_with(
            vec![session("London", 17.0, 8.0, vec![])],
            vec![session("London", 7.0, 16.0, vec![])],
        );
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::WindowError { table, role, .. } if table == "standard" && role == "main"
        ));
    }

    #[test]
    fn test_duplicate_session_detection() {
        let config = config_with(
            vec![session("Tokyo", 0.0, 9.0, vec![]), session("Tokyo", 1.0, 9.0, vec![])],
            vec![session("Tokyo", 0.0, 9.0, vec![])],
        );
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateSession { .. })));
    }

    #[test]
    fn test_duplicate_role_and_bad_kind() {
        let config = config_with(
            vec![session(
                "New York",
                13.0,
                22.0,
                vec![
                    secondary("killzoneAM", "killzone", 12.0, 15.0),
                    secondary("killzoneAM", "zone", 18.5, 21.0),
                ],
            )],
            vec![session("New York", 12.0, 21.0, vec![secondary("killzoneAM", "killzone", 11.0, 14.0)])],
        );
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRole { .. })));
        assert!(errors.iter().any(|e| e.to_string().contains("unknown kind 'zone'")));
    }

    #[test]
    fn test_table_mismatch() {
        let config = config_with(
            vec![session("London", 8.0, 17.0, vec![secondary("killzone", "killzone", 7.0, 10.0)])],
            vec![session("London", 7.0, 16.0, vec![]), session("Sydney", 21.0, 30.0, vec![])],
        );
        let errors = validate_config(&config);
        let mismatches: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::TableMismatch(_)))
            .collect();
        assert_eq!(mismatches.len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let config = config_with(vec![], vec![]);
        let errors = validate_config(&config);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyTable("standard".into()),
                ValidationError::EmptyTable("daylight".into())
            ]
        );
    }

    #[test]
    fn test_engine_settings() {
        let mut config = config_with(
            vec![session("London", 8.0, 17.0, vec![])],
            vec![session("London", 7.0, 16.0, vec![])],
        );
        config.engine.observer_offset_hours = Some(20.0);
        config.engine.dst_override = Some("sometimes".into());
        config.engine.warning_minutes = Some(0.0);
        config.engine.alert_lead_minutes = Some(0);
        config.engine.alert_tolerance_minutes = Some(90.0);
        config.service.alert_interval_seconds = Some(0);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 6);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::SettingError { .. })));
    }

    #[test]
    fn test_alert_interval_must_fit_tolerance() {
        let mut config = config_with(
            vec![session("London", 8.0, 17.0, vec![])],
            vec![session("London", 7.0, 16.0, vec![])],
        );

        // Five minutes between checks with the default one minute tolerance
        config.service.alert_interval_seconds = Some(300);
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::SettingError { setting, .. } if setting == "service.alert_interval_seconds"
        ));

        // Exactly twice the tolerance still lands one check on every trigger
        config.service.alert_interval_seconds = Some(120);
        assert!(validate_config(&config).is_empty());

        // A wider tolerance makes the slow cadence acceptable
        config.service.alert_interval_seconds = Some(300);
        config.engine.alert_tolerance_minutes = Some(2.5);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_volume_curve() {
        let mut config = config_with(
            vec![session("London", 8.0, 17.0, vec![])],
            vec![session("London", 7.0, 16.0, vec![])],
        );
        let mut curve = vec![50; 48];
        curve[3] = 120;
        curve[4] = -1;
        config.volume = Some(RawVolume { curve });
        assert_eq!(validate_config(&config).len(), 2);

        config.volume = Some(RawVolume { curve: vec![50; 24] });
        assert_eq!(validate_config(&config).len(), 1);
    }
}
