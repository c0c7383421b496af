//! Error types for fxsession

use thiserror::Error;

/// Error type for boundary checks on host-supplied time values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Invalid UTC offset {0}: expected a finite value between {min} and {max} hours", min = MIN_OFFSET_HOURS, max = MAX_OFFSET_HOURS)]
    InvalidOffset(f64),
}

/// Most negative offset accepted for an observer (UTC-12)
pub const MIN_OFFSET_HOURS: f64 = -12.0;

/// Most positive offset accepted for an observer (UTC+14)
pub const MAX_OFFSET_HOURS: f64 = 14.0;

impl FxError {
    pub fn time_format(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimeFormat {
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
