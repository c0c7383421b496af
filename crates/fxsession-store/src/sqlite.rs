//! SQLite-based store implementation

use chrono::{DateTime, NaiveDate, Utc};
use fxsession_api::EngineSnapshot;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Alert dedupe keys per UTC day
            CREATE TABLE IF NOT EXISTS fired_alerts (
                day TEXT NOT NULL,
                alert_key TEXT NOT NULL,
                fired_at TEXT NOT NULL,
                PRIMARY KEY (day, alert_key)
            );

            -- Published snapshot (single row)
            CREATE TABLE IF NOT EXISTS snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                snapshot_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_fired_alerts_day ON fired_alerts(day);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| fxsession_util::now_utc());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn load_fired_alerts(&self, day: NaiveDate) -> StoreResult<HashSet<String>> {
        let conn = self.conn()?;
        let day_str = day.format(DAY_FORMAT).to_string();

        let mut stmt = conn.prepare("SELECT alert_key FROM fired_alerts WHERE day = ?")?;
        let keys = stmt
            .query_map([&day_str], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        debug!(day = %day_str, count = keys.len(), "Fired alerts loaded");
        Ok(keys)
    }

    fn record_fired_alert(&self, day: NaiveDate, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let day_str = day.format(DAY_FORMAT).to_string();

        conn.execute(
            r#"
            INSERT INTO fired_alerts (day, alert_key, fired_at)
            VALUES (?, ?, ?)
            ON CONFLICT(day, alert_key) DO NOTHING
            "#,
            params![day_str, key, fxsession_util::now_utc().to_rfc3339()],
        )?;

        debug!(day = %day_str, key, "Fired alert recorded");
        Ok(())
    }

    fn prune_fired_alerts(&self, before: NaiveDate) -> StoreResult<usize> {
        let conn = self.conn()?;
        // ISO dates compare correctly as text
        let removed = conn.execute(
            "DELETE FROM fired_alerts WHERE day < ?",
            [before.format(DAY_FORMAT).to_string()],
        )?;

        if removed > 0 {
            debug!(removed, "Pruned fired alerts");
        }
        Ok(removed)
    }

    fn load_snapshot(&self) -> StoreResult<Option<EngineSnapshot>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row("SELECT snapshot_json FROM snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(s) => {
                let snapshot: EngineSnapshot = serde_json::from_str(&s)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &EngineSnapshot) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(snapshot)?;

        conn.execute(
            r#"
            INSERT INTO snapshot (id, snapshot_json)
            VALUES (1, ?)
            ON CONFLICT(id)
            DO UPDATE SET snapshot_json = excluded.snapshot_json
            "#,
            [json],
        )?;

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
