//! Store trait definitions

use chrono::NaiveDate;
use fxsession_api::EngineSnapshot;
use std::collections::HashSet;

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Fired alerts

    /// Dedupe keys of the alerts already fired on a UTC day
    fn load_fired_alerts(&self, day: NaiveDate) -> StoreResult<HashSet<String>>;

    /// Record a fired alert. Recording the same key twice is a no-op.
    fn record_fired_alert(&self, day: NaiveDate, key: &str) -> StoreResult<()>;

    /// Delete fired alerts of days before `before`, returning how many went
    fn prune_fired_alerts(&self, before: NaiveDate) -> StoreResult<usize>;

    // Snapshot

    /// Load the last published snapshot
    fn load_snapshot(&self) -> StoreResult<Option<EngineSnapshot>>;

    /// Replace the published snapshot
    fn save_snapshot(&self, snapshot: &EngineSnapshot) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
