//! Audit event types

use chrono::{DateTime, Utc};
use fxsession_api::TableVariant;
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Policy loaded/reloaded
    PolicyLoaded { session_count: usize },

    /// Effective session table changed
    TableSwitched { from: TableVariant, to: TableVariant },

    /// Session alert handed to the notification sink
    AlertFired { alert_id: String, trigger_hour: f64 },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: fxsession_util::now_utc(),
            event,
        }
    }
}
