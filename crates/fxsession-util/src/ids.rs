//! Strongly-typed identifiers for fxsession

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a trading session in the session tables (e.g. "London")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionName(String);

impl SessionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable identifier of a scheduled alert, e.g. `London/main/open`.
///
/// The same id is produced for the same window and alert kind on every
/// day, so it can be combined with a date to build a dedupe key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertId(String);

impl AlertId {
    pub fn new(session: &SessionName, role: &str, kind: &str) -> Self {
        Self(format!("{}/{}/{}", session, role, kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
