//! Time utilities for fxsession
//!
//! Session math works on fractional hours of the UTC day (`8.5` is 08:30
//! UTC). Observers are described by a fixed decimal offset from UTC, so
//! converting between the UTC and local axis is modular arithmetic over a
//! 24-hour circle.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `FXSESSION_MOCK_TIME` environment variable can be set
//! to override the system time. The value is interpreted as UTC and the mock
//! clock advances at the same rate as the real one, which makes it easy to
//! sit on a DST transition or a session boundary by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-03-09 12:55:00`)

use crate::{FxError, MAX_OFFSET_HOURS, MIN_OFFSET_HOURS, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "FXSESSION_MOCK_TIME";

/// Hours on the UTC circle
pub const HOURS_PER_DAY: f64 = 24.0;

/// Seconds per hour, for converting fractional hours to countdowns
pub const SECONDS_PER_HOUR: f64 = 3600.0;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Utc::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        let mock_dt = naive_dt.and_utc();
                        let offset = mock_dt.signed_duration_since(Utc::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current UTC time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now_utc() -> DateTime<Utc> {
    let real_now = Utc::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Fractional hour of the UTC day for an instant (`07:46:30` -> `7.775`).
pub fn utc_hours_of_day(dt: &DateTime<Utc>) -> f64 {
    dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / SECONDS_PER_HOUR
}

/// Wrap any hour value onto `[0, 24)`.
///
/// Handles negative values and values past 24 (windows that cross
/// midnight are stored with `end > 24`).
pub fn normalize_hour(hour: f64) -> f64 {
    let wrapped = hour.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= HOURS_PER_DAY { 0.0 } else { wrapped }
}

/// Convert a UTC hour to the observer's local hour, in `[0, 24)`.
pub fn utc_hour_to_local(utc_hour: f64, offset_hours: f64) -> f64 {
    normalize_hour(utc_hour + offset_hours)
}

/// Convert an observer-local hour to a UTC hour, in `[0, 24)`.
pub fn local_hour_to_utc(local_hour: f64, offset_hours: f64) -> f64 {
    normalize_hour(local_hour - offset_hours)
}

/// Format a fractional hour as `HH:MM`.
///
/// Minutes are rounded first and the result is wrapped again, so
/// `23.999` renders as `00:00` rather than `24:00`.
pub fn format_hour(hour: f64) -> String {
    let total_minutes = (hour * 60.0).round() as i64;
    let wrapped = total_minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Check a host-supplied observer offset before it reaches the engine.
pub fn validate_offset(offset_hours: f64) -> Result<f64> {
    if offset_hours.is_finite() && (MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&offset_hours) {
        Ok(offset_hours)
    } else {
        Err(FxError::InvalidOffset(offset_hours))
    }
}

/// Wall-clock time of day, as found in `HH:MM` calendar timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Returns the time as fractional hours (`13:30` -> `13.5`)
    pub fn as_hours(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0
    }

    /// Returns minutes since midnight
    pub fn as_minutes_from_midnight(&self) -> u32 {
        (self.hour as u32) * 60 + self.minute as u32
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WallClock {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        parse_wall_clock(s)
    }
}

/// Parse an `HH:MM` string into a [`WallClock`].
pub fn parse_wall_clock(s: &str) -> Result<WallClock> {
    let (hour, minute) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| FxError::time_format(s, "Expected HH:MM format"))?;

    let hour: u8 = hour
        .parse()
        .map_err(|_| FxError::time_format(s, "Invalid hour"))?;
    let minute: u8 = minute
        .parse()
        .map_err(|_| FxError::time_format(s, "Invalid minute"))?;

    if hour >= 24 {
        return Err(FxError::time_format(s, "Hour must be 0-23"));
    }
    if minute >= 60 {
        return Err(FxError::time_format(s, "Minute must be 0-59"));
    }

    Ok(WallClock { hour, minute })
}

/// Place a UTC `HH:MM` calendar timestamp on the observer's local hour axis.
///
/// Economic calendar feeds publish event times as UTC `HH:MM` strings; this
/// puts them on the same axis as the session bands.
pub fn calendar_event_local_hour(utc_hhmm: &str, offset_hours: f64) -> Result<f64> {
    let clock = parse_wall_clock(utc_hhmm)?;
    Ok(utc_hour_to_local(clock.as_hours(), offset_hours))
}

/// Format a countdown in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
