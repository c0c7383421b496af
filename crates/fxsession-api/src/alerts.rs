//! Alert events derived from session windows

use fxsession_util::{AlertId, SessionName, format_hour};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::WindowKind;

/// Point in a window's life that triggers an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OpenBefore,
    Open,
    CloseBefore,
    Close,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::OpenBefore,
        AlertKind::Open,
        AlertKind::CloseBefore,
        AlertKind::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::OpenBefore => "open_before",
            AlertKind::Open => "open",
            AlertKind::CloseBefore => "close_before",
            AlertKind::Close => "close",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled alert for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: AlertId,
    pub session: SessionName,
    pub role: String,
    pub window_kind: WindowKind,
    pub label: String,
    pub kind: AlertKind,
    /// UTC hour at which the alert fires. Not normalized: may be negative or
    /// exceed 24.
    pub trigger_hour: f64,
    /// Minutes between the "before" alert and the boundary it announces
    pub lead_minutes: u32,
}

/// Title/body pair handed to the notification sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl AlertEvent {
    pub fn notification(&self) -> Notification {
        let title = match self.kind {
            AlertKind::OpenBefore => format!("{} opens in {} minutes", self.label, self.lead_minutes),
            AlertKind::Open => format!("{} is open", self.label),
            AlertKind::CloseBefore => format!("{} closes in {} minutes", self.label, self.lead_minutes),
            AlertKind::Close => format!("{} has closed", self.label),
        };
        let body = format!(
            "{} {} at {} UTC",
            self.session,
            self.kind.as_str().replace('_', " "),
            format_hour(self.trigger_hour)
        );
        Notification { title, body }
    }
}
