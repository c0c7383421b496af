//! Derived state published by the engine on every tick

use chrono::{DateTime, Utc};
use fxsession_util::SessionName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{DstStatus, TableVariant, WindowKind};

/// Number of half-hour slots in the volume curve
pub const VOLUME_SLOTS: usize = 48;

/// Highest intensity value a volume slot may hold
pub const MAX_VOLUME: u8 = 100;

/// Open/closed phase of a window at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    Closed,
    Open,
    /// Closing soon (positive countdown) or opening soon (negative countdown)
    Warning,
}

/// State of one window at one instant.
///
/// While open, `elapsed_secs` counts from the window start and
/// `remaining_secs` down to its end. For an opening-soon warning both fields
/// hold the same negative countdown to the start. Closed windows report zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub phase: WindowPhase,
    pub elapsed_secs: i64,
    pub remaining_secs: i64,
}

impl WindowState {
    pub const CLOSED: WindowState = WindowState {
        phase: WindowPhase::Closed,
        elapsed_secs: 0,
        remaining_secs: 0,
    };

    /// Open or closing soon
    pub fn is_active(&self) -> bool {
        match self.phase {
            WindowPhase::Open => true,
            WindowPhase::Warning => self.remaining_secs > 0,
            WindowPhase::Closed => false,
        }
    }

    /// Warning issued before the window opens
    pub fn is_pre_open(&self) -> bool {
        self.phase == WindowPhase::Warning && self.remaining_secs < 0
    }
}

/// Evaluated window with its identity, as consumed by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub session: SessionName,
    pub role: String,
    pub kind: WindowKind,
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub state: WindowState,
}

/// Full result of one engine evaluation.
///
/// Snapshots are immutable values; hosts replace the whole snapshot on each
/// tick rather than patching fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub api_version: u32,
    pub now_utc: DateTime<Utc>,
    pub observer_offset_hours: f64,
    pub now_local_hour: f64,
    pub table: TableVariant,
    pub dst: DstStatus,
    /// Every window of every session in table order
    pub windows: Vec<WindowStatus>,
    /// Main-window state per session
    pub sessions: BTreeMap<SessionName, WindowState>,
}

impl EngineSnapshot {
    /// Windows that are open or in a warning phase
    pub fn active_windows(&self) -> impl Iterator<Item = &WindowStatus> {
        self.windows
            .iter()
            .filter(|w| w.state.phase != WindowPhase::Closed)
    }

    pub fn session_state(&self, name: &str) -> Option<&WindowState> {
        self.sessions.get(&SessionName::new(name))
    }
}

/// Volume curve validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeCurveError {
    #[error("volume curve must have {expected} slots, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("volume slot {slot} has value {value}, expected 0-{max}", max = MAX_VOLUME)]
    OutOfRange { slot: usize, value: u8 },
}

/// Mean relative trading intensity for each half-hour slot of a day.
///
/// Slot `i` covers `[i * 0.5, i * 0.5 + 0.5)` hours on whatever axis the
/// curve is expressed in: UTC for the configured curve, observer-local after
/// rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct VolumeCurve(Vec<u8>);

impl VolumeCurve {
    pub fn new(slots: Vec<u8>) -> Result<Self, VolumeCurveError> {
        if slots.len() != VOLUME_SLOTS {
            return Err(VolumeCurveError::WrongLength {
                expected: VOLUME_SLOTS,
                actual: slots.len(),
            });
        }
        if let Some((slot, &value)) = slots.iter().enumerate().find(|(_, v)| **v > MAX_VOLUME) {
            return Err(VolumeCurveError::OutOfRange { slot, value });
        }
        Ok(Self(slots))
    }

    pub fn slots(&self) -> &[u8] {
        &self.0
    }

    /// Value of the slot containing `hour` on this curve's axis
    pub fn at_hour(&self, hour: f64) -> u8 {
        self.0[slot_for_hour(hour)]
    }

    /// Curve shifted right by `steps` slots: output slot `i` holds input
    /// slot `i - steps` (mod 48).
    pub fn rotated_right(&self, steps: usize) -> Self {
        let mut slots = self.0.clone();
        slots.rotate_right(steps % VOLUME_SLOTS);
        Self(slots)
    }
}

impl TryFrom<Vec<u8>> for VolumeCurve {
    type Error = VolumeCurveError;

    fn try_from(slots: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(slots)
    }
}

impl From<VolumeCurve> for Vec<u8> {
    fn from(curve: VolumeCurve) -> Self {
        curve.0
    }
}

/// Half-hour slot index for an hour value, wrapped onto the day
pub fn slot_for_hour(hour: f64) -> usize {
    let slot = (fxsession_util::normalize_hour(hour) * 2.0).floor() as usize;
    slot.min(VOLUME_SLOTS - 1)
}

/// Volume curve rotated onto the observer's local axis, with a "now" marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeView {
    pub curve: VolumeCurve,
    pub observer_offset_hours: f64,
    pub now_local_hour: f64,
    pub now_slot: usize,
}
