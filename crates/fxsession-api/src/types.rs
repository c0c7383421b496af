//! Session table types

use fxsession_util::{HOURS_PER_DAY, SessionName, format_hour};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role name used for a session's primary window
pub const MAIN_ROLE: &str = "main";

/// Forex centre whose daylight-saving calendar can move session boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstRegion {
    Us,
    Europe,
    Australia,
}

impl fmt::Display for DstRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DstRegion::Us => "US",
            DstRegion::Europe => "Europe",
            DstRegion::Australia => "Australia",
        };
        f.write_str(name)
    }
}

/// DST status of every region on a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DstStatus {
    pub us: bool,
    pub europe: bool,
    pub australia: bool,
    /// US and Europe both on summer time. Australia does not participate.
    pub global: bool,
}

impl DstStatus {
    pub fn region(&self, region: DstRegion) -> bool {
        match region {
            DstRegion::Us => self.us,
            DstRegion::Europe => self.europe,
            DstRegion::Australia => self.australia,
        }
    }
}

/// Which of the two static session tables is in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableVariant {
    Standard,
    Daylight,
}

impl TableVariant {
    pub fn from_dst(active: bool) -> Self {
        if active {
            TableVariant::Daylight
        } else {
            TableVariant::Standard
        }
    }
}

impl fmt::Display for TableVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableVariant::Standard => f.write_str("standard"),
            TableVariant::Daylight => f.write_str("daylight"),
        }
    }
}

/// Kind of a session window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// The session's primary active hours
    Main,
    /// Intersection of two sessions' main windows
    Overlap,
    /// High-volatility sub-window
    Killzone,
}

/// A `[start, end)` range in UTC hours.
///
/// `end` may exceed 24 for windows that cross UTC midnight: `[21, 30)` runs
/// from 21:00 UTC to 06:00 UTC the next day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

impl SessionWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            label: None,
            color: None,
            tooltip: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn duration_hours(&self) -> f64 {
        self.end - self.start
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end > HOURS_PER_DAY
    }

    /// `HH:MM-HH:MM` in UTC
    pub fn describe(&self) -> String {
        format!("{}-{}", format_hour(self.start), format_hour(self.end))
    }
}

/// A named overlap or killzone attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryWindow {
    /// Role key, e.g. `overlapAsia` or `killzoneAM`
    pub role: String,
    pub kind: WindowKind,
    pub window: SessionWindow,
}

/// One trading session and its windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefinition {
    pub name: SessionName,
    pub main: SessionWindow,
    #[serde(default)]
    pub secondary: Vec<SecondaryWindow>,
}

/// Borrowed view of any window of a session
#[derive(Debug, Clone, Copy)]
pub struct WindowRef<'a> {
    pub session: &'a SessionName,
    pub role: &'a str,
    pub kind: WindowKind,
    pub window: &'a SessionWindow,
}

impl WindowRef<'_> {
    /// Display name: the window label, or `"<session> <role>"` when unlabeled
    pub fn display_label(&self) -> String {
        match (&self.window.label, self.kind) {
            (Some(label), _) => label.clone(),
            (None, WindowKind::Main) => self.session.to_string(),
            (None, _) => format!("{} {}", self.session, self.role),
        }
    }
}

impl SessionDefinition {
    pub fn new(name: impl Into<SessionName>, main: SessionWindow) -> Self {
        Self {
            name: name.into(),
            main,
            secondary: Vec::new(),
        }
    }

    pub fn with_window(mut self, role: impl Into<String>, kind: WindowKind, window: SessionWindow) -> Self {
        self.secondary.push(SecondaryWindow {
            role: role.into(),
            kind,
            window,
        });
        self
    }

    /// All windows of the session, main window first.
    pub fn windows(&self) -> impl Iterator<Item = WindowRef<'_>> {
        std::iter::once(WindowRef {
            session: &self.name,
            role: MAIN_ROLE,
            kind: WindowKind::Main,
            window: &self.main,
        })
        .chain(self.secondary.iter().map(move |s| WindowRef {
            session: &self.name,
            role: s.role.as_str(),
            kind: s.kind,
            window: &s.window,
        }))
    }

    /// Find a window by role (`"main"` for the primary window)
    pub fn window(&self, role: &str) -> Option<&SessionWindow> {
        if role == MAIN_ROLE {
            return Some(&self.main);
        }
        self.secondary
            .iter()
            .find(|s| s.role == role)
            .map(|s| &s.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york() -> SessionDefinition {
        SessionDefinition::new("New York", SessionWindow::new(13.0, 22.0))
            .with_window(
                "killzoneAM",
                WindowKind::Killzone,
                SessionWindow::new(12.0, 15.0).with_label("NY AM Killzone"),
            )
            .with_window("overlapEurope", WindowKind::Overlap, SessionWindow::new(13.0, 17.0))
    }

    #[test]
    fn windows_iterates_main_first() {
        let session = new_york();
        let roles: Vec<_> = session.windows().map(|w| w.role).collect();
        assert_eq!(roles, vec!["main", "killzoneAM", "overlapEurope"]);
        assert_eq!(session.windows().next().unwrap().kind, WindowKind::Main);
    }

    #[test]
    fn display_labels() {
        let session = new_york();
        let labels: Vec<_> = session.windows().map(|w| w.display_label()).collect();
        assert_eq!(labels, vec!["New York", "NY AM Killzone", "New York overlapEurope"]);
    }

    #[test]
    fn window_lookup_by_role() {
        let session = new_york();
        assert_eq!(session.window("main").unwrap().start, 13.0);
        assert_eq!(session.window("killzoneAM").unwrap().end, 15.0);
        assert!(session.window("killzonePM").is_none());
    }

    #[test]
    fn midnight_crossing_window() {
        let sydney = SessionWindow::new(21.0, 30.0);
        assert!(sydney.crosses_midnight());
        assert_eq!(sydney.duration_hours(), 9.0);
        assert_eq!(sydney.describe(), "21:00-06:00");
        assert!(!SessionWindow::new(8.0, 17.0).crosses_midnight());
    }

    #[test]
    fn table_variant_from_dst() {
        assert_eq!(TableVariant::from_dst(true), TableVariant::Daylight);
        assert_eq!(TableVariant::from_dst(false), TableVariant::Standard);
        assert_eq!(TableVariant::Daylight.to_string(), "daylight");
    }

    #[test]
    fn dst_region_serialization() {
        let json = serde_json::to_string(&DstRegion::Australia).unwrap();
        assert_eq!(json, "\"australia\"");
        let status = DstStatus {
            us: true,
            europe: false,
            australia: true,
            global: false,
        };
        assert!(status.region(DstRegion::Us));
        assert!(!status.region(DstRegion::Europe));
    }
}
