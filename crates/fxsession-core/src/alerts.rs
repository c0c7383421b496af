//! Alert scheduling and once-per-day dedupe

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use fxsession_api::{AlertEvent, AlertKind, SessionDefinition};
use fxsession_util::{AlertId, HOURS_PER_DAY, normalize_hour, utc_hours_of_day};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default firing tolerance (one minute)
pub const DEFAULT_ALERT_TOLERANCE_HOURS: f64 = 1.0 / 60.0;

/// Four alerts per window: `lead_minutes` before the open, the open, the same
/// lead before the close, and the close.
///
/// Trigger hours are not normalized, so an alert 15 minutes before a
/// midnight open has trigger hour `-0.25`.
pub fn compute_alert_events(table: &[SessionDefinition], lead_minutes: u32) -> Vec<AlertEvent> {
    let lead_hours = lead_minutes as f64 / 60.0;
    let mut events = Vec::new();

    for session in table {
        for window in session.windows() {
            let label = window.display_label();
            for kind in AlertKind::ALL {
                let trigger_hour = match kind {
                    AlertKind::OpenBefore => window.window.start - lead_hours,
                    AlertKind::Open => window.window.start,
                    AlertKind::CloseBefore => window.window.end - lead_hours,
                    AlertKind::Close => window.window.end,
                };
                events.push(AlertEvent {
                    id: AlertId::new(&session.name, window.role, kind.as_str()),
                    session: session.name.clone(),
                    role: window.role.to_string(),
                    window_kind: window.kind,
                    label: label.clone(),
                    kind,
                    trigger_hour,
                    lead_minutes,
                });
            }
        }
    }

    events
}

/// Signed distance in hours from now to the nearest occurrence of `trigger`,
/// in `[-12, 12)`.
fn hours_until(trigger_hour: f64, now_hours: f64) -> f64 {
    (normalize_hour(trigger_hour) - normalize_hour(now_hours) + 12.0).rem_euclid(HOURS_PER_DAY) - 12.0
}

/// Whether `now_hours` is within `tolerance_hours` of the event's trigger,
/// measured around the 24-hour circle. Stateless: repeated calls inside the
/// tolerance all return true.
pub fn should_fire(event: &AlertEvent, now_hours: f64, tolerance_hours: f64) -> bool {
    let distance = (normalize_hour(event.trigger_hour) - normalize_hour(now_hours)).abs();
    distance.min(HOURS_PER_DAY - distance) <= tolerance_hours
}

/// An alert that became due, with the dedupe key it was recorded under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredAlert {
    pub event: AlertEvent,
    pub key: String,
    /// UTC instant of the trigger this firing belongs to
    pub occurrence: DateTime<Utc>,
}

impl FiredAlert {
    /// UTC day the key is filed under
    pub fn day(&self) -> NaiveDate {
        self.occurrence.date_naive()
    }
}

/// Caller-owned set of alerts already fired.
///
/// Keys are `"{alert id}@{UTC date}"` where the date is that of the trigger
/// occurrence. Rolling to a new day keeps the previous day so a trigger
/// straddling midnight is not fired twice.
#[derive(Debug, Clone, Default)]
pub struct FiredAlerts {
    fired: HashMap<String, NaiveDate>,
}

impl FiredAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dedupe key for an event on a UTC day
    pub fn key(event: &AlertEvent, day: NaiveDate) -> String {
        format!("{}@{}", event.id, day.format("%Y-%m-%d"))
    }

    /// UTC days whose keys can block a firing on `today`.
    ///
    /// A trigger at 00:00 that fires just before midnight is filed under the
    /// next day, so tomorrow is included.
    pub fn live_days(today: NaiveDate) -> Vec<NaiveDate> {
        [today.pred_opt(), Some(today), today.succ_opt()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Seed with keys persisted for `day`
    pub fn extend(&mut self, day: NaiveDate, keys: impl IntoIterator<Item = String>) {
        self.fired.extend(keys.into_iter().map(|key| (key, day)));
    }

    /// Forget days before yesterday. Returns the number of keys dropped.
    pub fn roll(&mut self, today: NaiveDate) -> usize {
        let keep_from = today.pred_opt().unwrap_or(today);
        let before = self.fired.len();
        self.fired.retain(|_, day| *day >= keep_from);
        before - self.fired.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fired.contains_key(key)
    }

    /// Record a key. Returns false if it was already recorded.
    pub fn insert(&mut self, key: String, day: NaiveDate) -> bool {
        self.fired.insert(key, day).is_none()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Events due at `now` that have not fired for this occurrence yet.
///
/// Due events are recorded in `fired` before returning, so a second call
/// within the tolerance yields nothing.
pub fn due_alerts(
    events: &[AlertEvent],
    now: &DateTime<Utc>,
    tolerance_hours: f64,
    fired: &mut FiredAlerts,
) -> Vec<FiredAlert> {
    fired.roll(now.date_naive());
    let now_hours = utc_hours_of_day(now);

    let mut due = Vec::new();
    for event in events {
        if !should_fire(event, now_hours, tolerance_hours) {
            continue;
        }
        let offset_ms = (hours_until(event.trigger_hour, now_hours) * 3_600_000.0).round() as i64;
        let occurrence = *now + TimeDelta::milliseconds(offset_ms);
        let day = occurrence.date_naive();
        let key = FiredAlerts::key(event, day);
        if fired.insert(key.clone(), day) {
            due.push(FiredAlert {
                event: event.clone(),
                key,
                occurrence,
            });
        }
    }

    due
}
