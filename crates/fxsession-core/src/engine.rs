//! Session engine facade

use chrono::{DateTime, NaiveDate, Utc};
use fxsession_api::{
    API_VERSION, AlertEvent, EngineSnapshot, SessionDefinition, TableVariant, VolumeView,
};
use fxsession_config::{EngineSettings, Policy};
use fxsession_util::{utc_hour_to_local, utc_hours_of_day};
use tracing::{debug, info};

use crate::{
    CoreEvent, FiredAlerts, compute_alert_events, dst_status, due_alerts, evaluate_all_windows,
    select_table_variant, volume_view,
};

/// Inputs of one engine evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub now_utc: DateTime<Utc>,
    pub observer_offset_hours: f64,
    /// `Some(true)` forces the daylight table, `Some(false)` the standard one
    pub manual_dst_override: Option<bool>,
    pub auto_detect_dst: bool,
}

impl TickContext {
    /// Context using the configured observer and DST settings
    pub fn from_settings(now_utc: DateTime<Utc>, settings: &EngineSettings) -> Self {
        Self {
            now_utc,
            observer_offset_hours: settings.observer_offset_hours,
            manual_dst_override: settings.dst_override,
            auto_detect_dst: settings.auto_detect_dst,
        }
    }

    pub fn with_offset(mut self, offset_hours: f64) -> Self {
        self.observer_offset_hours = offset_hours;
        self
    }

    /// UTC calendar date, used for the DST calendars
    pub fn date(&self) -> NaiveDate {
        self.now_utc.date_naive()
    }

    pub fn utc_hours(&self) -> f64 {
        utc_hours_of_day(&self.now_utc)
    }
}

/// The session engine
///
/// Holds the validated policy and the table seen on the last tick. All
/// evaluation is pure; the only state carried between ticks is the table
/// used to report switches.
pub struct SessionEngine {
    policy: Policy,
    current_table: Option<TableVariant>,
}

impl SessionEngine {
    /// Create a new session engine
    pub fn new(policy: Policy) -> Self {
        info!(
            session_count = policy.session_count(),
            observer_offset_hours = policy.engine.observer_offset_hours,
            "Session engine initialized"
        );

        Self {
            policy,
            current_table: None,
        }
    }

    /// Get current policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Reload policy
    pub fn reload_policy(&mut self, policy: Policy) -> CoreEvent {
        let session_count = policy.session_count();
        self.policy = policy;

        info!(session_count, "Policy reloaded");

        CoreEvent::PolicyReloaded { session_count }
    }

    /// Tick context for `now` with the configured settings
    pub fn context_at(&self, now_utc: DateTime<Utc>) -> TickContext {
        TickContext::from_settings(now_utc, &self.policy.engine)
    }

    /// Effective table for a context
    pub fn table_variant(&self, ctx: &TickContext) -> TableVariant {
        select_table_variant(ctx.date(), ctx.manual_dst_override, ctx.auto_detect_dst)
    }

    pub fn table(&self, variant: TableVariant) -> &[SessionDefinition] {
        self.policy.tables.get(variant)
    }

    /// Evaluate every window at the context's instant
    pub fn evaluate(&self, ctx: &TickContext) -> EngineSnapshot {
        let table = self.table_variant(ctx);
        let now_hours = ctx.utc_hours();
        let (windows, sessions) = evaluate_all_windows(
            self.table(table),
            now_hours,
            self.policy.engine.warning_threshold_hours,
        );

        EngineSnapshot {
            api_version: API_VERSION,
            now_utc: ctx.now_utc,
            observer_offset_hours: ctx.observer_offset_hours,
            now_local_hour: utc_hour_to_local(now_hours, ctx.observer_offset_hours),
            table,
            dst: dst_status(ctx.date()),
            windows,
            sessions,
        }
    }

    /// Alert schedule for one table
    pub fn alert_events(&self, variant: TableVariant) -> Vec<AlertEvent> {
        compute_alert_events(self.table(variant), self.policy.engine.alert_lead_minutes)
    }

    /// Configured volume curve rotated for an observer
    pub fn volume_view(&self, offset_hours: f64, now_utc: &DateTime<Utc>) -> VolumeView {
        volume_view(&self.policy.volume, offset_hours, utc_hours_of_day(now_utc))
    }

    /// Advance the engine: report a table switch and fire due alerts.
    ///
    /// Fired alerts are recorded in `fired`, which the caller owns and may
    /// persist between runs.
    pub fn tick(&mut self, ctx: &TickContext, fired: &mut FiredAlerts) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        let variant = self.table_variant(ctx);
        if let Some(previous) = self.current_table
            && previous != variant
        {
            info!(from = %previous, to = %variant, "Session table switched");
            events.push(CoreEvent::TableSwitched {
                from: previous,
                to: variant,
            });
        }
        self.current_table = Some(variant);

        let schedule = self.alert_events(variant);
        for alert in due_alerts(
            &schedule,
            &ctx.now_utc,
            self.policy.engine.alert_tolerance_hours,
            fired,
        ) {
            debug!(key = %alert.key, kind = %alert.event.kind, "Alert due");
            let notification = alert.event.notification();
            events.push(CoreEvent::AlertFired { alert, notification });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fxsession_api::WindowPhase;

    fn engine() -> SessionEngine {
        SessionEngine::new(fxsession_config::default_policy().unwrap())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn evaluate_london_winter_morning() {
        let engine = engine();
        let ctx = engine.context_at(at(2025, 1, 15, 8, 5)).with_offset(5.5);
        let snapshot = engine.evaluate(&ctx);

        assert_eq!(snapshot.table, TableVariant::Standard);
        assert!(!snapshot.dst.global);
        assert!(snapshot.dst.australia);
        assert!((snapshot.now_local_hour - (13.5 + 5.0 / 60.0)).abs() < 1e-9);

        let london = snapshot.session_state("London").unwrap();
        assert_eq!(london.phase, WindowPhase::Open);
        assert_eq!(london.elapsed_secs, 300);
        assert_eq!(london.remaining_secs, 32100);

        // Sydney [22, 31) closed at 07:00 UTC, before 08:05
        assert_eq!(snapshot.session_state("Sydney").unwrap().phase, WindowPhase::Closed);
        assert_eq!(snapshot.sessions.len(), 4);
    }

    #[test]
    fn snapshot_serializes() {
        let engine = engine();
        let snapshot = engine.evaluate(&engine.context_at(at(2025, 1, 15, 16, 50)));
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["table"], "standard");
        assert_eq!(json["sessions"]["London"]["phase"], "warning");
        assert_eq!(json["sessions"]["London"]["remaining_secs"], 600);
    }

    #[test]
    fn evaluate_uses_daylight_table_in_summer() {
        let engine = engine();
        let snapshot = engine.evaluate(&engine.context_at(at(2025, 7, 1, 7, 30)));

        assert_eq!(snapshot.table, TableVariant::Daylight);
        // London opens at 07:00 UTC in summer
        let london = snapshot.session_state("London").unwrap();
        assert_eq!(london.phase, WindowPhase::Open);
        assert_eq!(london.elapsed_secs, 1800);
    }

    #[test]
    fn manual_override_wins() {
        let engine = engine();
        let mut ctx = engine.context_at(at(2025, 7, 1, 7, 30));
        ctx.manual_dst_override = Some(false);
        assert_eq!(engine.evaluate(&ctx).table, TableVariant::Standard);
    }

    #[test]
    fn tick_reports_table_switch() {
        let mut engine = engine();
        let mut fired = FiredAlerts::new();

        // Europe still on winter time: US alone does not switch tables
        let events = engine.tick(&engine.context_at(at(2025, 3, 29, 3, 0)), &mut fired);
        assert!(events.is_empty());

        let events = engine.tick(&engine.context_at(at(2025, 3, 30, 3, 0)), &mut fired);
        assert_eq!(
            events,
            vec![CoreEvent::TableSwitched {
                from: TableVariant::Standard,
                to: TableVariant::Daylight
            }]
        );

        let events = engine.tick(&engine.context_at(at(2025, 3, 30, 3, 0)), &mut fired);
        assert!(events.is_empty());
    }

    #[test]
    fn tick_fires_alerts_once() {
        let mut engine = engine();
        let mut fired = FiredAlerts::new();
        let ctx = engine.context_at(at(2025, 1, 15, 7, 45));

        let events = engine.tick(&ctx, &mut fired);
        let fired_ids: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::AlertFired { alert, .. } => Some(alert.event.id.as_str().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(fired_ids, vec!["London/main/open_before", "London/overlapAsia/open_before"]);

        match &events[0] {
            CoreEvent::AlertFired { notification, alert } => {
                assert_eq!(notification.title, "London opens in 15 minutes");
                assert_eq!(alert.key, "London/main/open_before@2025-01-15");
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(engine.tick(&ctx, &mut fired).is_empty());
        assert_eq!(fired.len(), 2);
    }

    #[test]
    fn alert_schedule_covers_every_window() {
        let engine = engine();
        let windows: usize = engine
            .table(TableVariant::Standard)
            .iter()
            .map(|s| s.windows().count())
            .sum();
        assert_eq!(engine.alert_events(TableVariant::Standard).len(), windows * 4);
    }

    #[test]
    fn volume_view_for_observer() {
        let engine = engine();
        let view = engine.volume_view(-5.0, &at(2025, 1, 15, 14, 0));
        assert_eq!(view.now_local_hour, 9.0);
        assert_eq!(view.now_slot, 18);
        assert_eq!(view.curve.slots()[18], engine.policy().volume.at_hour(14.0));
    }

    #[test]
    fn reload_policy_reports_count() {
        let mut engine = engine();
        let event = engine.reload_policy(fxsession_config::default_policy().unwrap());
        assert_eq!(event, CoreEvent::PolicyReloaded { session_count: 4 });
    }
}
