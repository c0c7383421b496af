//! Per-window open/warning/closed evaluation

use fxsession_api::{SessionDefinition, SessionWindow, WindowPhase, WindowState, WindowStatus};
use fxsession_util::{HOURS_PER_DAY, SECONDS_PER_HOUR, SessionName, normalize_hour};
use std::collections::BTreeMap;

/// Default open/close warning threshold (15 minutes)
pub const DEFAULT_WARNING_THRESHOLD_HOURS: f64 = 0.25;

fn to_secs(hours: f64) -> i64 {
    (hours * SECONDS_PER_HOUR).round() as i64
}

/// Evaluate one window at `now_utc_hours`.
///
/// `now_utc_hours` is wrapped onto `[0, 24)` first. A window is open when now
/// falls in `[start, end)` or, for windows crossing midnight, in
/// `[start - 24, end - 24)`. Within `threshold_hours` of the end an open
/// window is in the warning phase; within `threshold_hours` before the start
/// a closed window warns with a negative countdown.
pub fn evaluate_window(window: &SessionWindow, now_utc_hours: f64, threshold_hours: f64) -> WindowState {
    let now = normalize_hour(now_utc_hours);

    let bounds = [
        (window.start, window.end),
        (window.start - HOURS_PER_DAY, window.end - HOURS_PER_DAY),
    ];
    if let Some((start, end)) = bounds.into_iter().find(|(start, end)| now >= *start && now < *end) {
        let remaining = end - now;
        let phase = if remaining > 0.0 && remaining <= threshold_hours {
            WindowPhase::Warning
        } else {
            WindowPhase::Open
        };
        return WindowState {
            phase,
            elapsed_secs: to_secs(now - start),
            remaining_secs: to_secs(remaining),
        };
    }

    let until_open = (window.start - now).rem_euclid(HOURS_PER_DAY);
    if until_open > 0.0 && until_open <= threshold_hours {
        let countdown = -to_secs(until_open);
        return WindowState {
            phase: WindowPhase::Warning,
            elapsed_secs: countdown,
            remaining_secs: countdown,
        };
    }

    WindowState::CLOSED
}

/// Evaluate every window of every session in table order.
///
/// Returns the flat list of window statuses and the main-window state of
/// each session keyed by name.
pub fn evaluate_all_windows(
    table: &[SessionDefinition],
    now_utc_hours: f64,
    threshold_hours: f64,
) -> (Vec<WindowStatus>, BTreeMap<SessionName, WindowState>) {
    let mut windows = Vec::new();
    let mut sessions = BTreeMap::new();

    for session in table {
        for window in session.windows() {
            let state = evaluate_window(window.window, now_utc_hours, threshold_hours);
            if window.role == fxsession_api::MAIN_ROLE {
                sessions.insert(session.name.clone(), state);
            }
            windows.push(WindowStatus {
                session: session.name.clone(),
                role: window.role.to_string(),
                kind: window.kind,
                label: window.display_label(),
                start: window.window.start,
                end: window.window.end,
                state,
            });
        }
    }

    (windows, sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxsession_api::WindowKind;

    const T: f64 = DEFAULT_WARNING_THRESHOLD_HOURS;

    fn hm(hour: u32, minute: u32) -> f64 {
        hour as f64 + minute as f64 / 60.0
    }

    #[test]
    fn london_scenario() {
        let london = SessionWindow::new(8.0, 17.0);

        let state = evaluate_window(&london, hm(7, 46), T);
        assert_eq!(state.phase, WindowPhase::Warning);
        assert_eq!(state.elapsed_secs, -840);
        assert_eq!(state.remaining_secs, -840);

        let state = evaluate_window(&london, hm(8, 5), T);
        assert_eq!(state.phase, WindowPhase::Open);
        assert_eq!(state.elapsed_secs, 300);
        assert_eq!(state.remaining_secs, 32100);

        let state = evaluate_window(&london, hm(16, 50), T);
        assert_eq!(state.phase, WindowPhase::Warning);
        assert_eq!(state.elapsed_secs, 31800);
        assert_eq!(state.remaining_secs, 600);

        assert_eq!(evaluate_window(&london, 17.0, T), WindowState::CLOSED);
        assert_eq!(evaluate_window(&london, hm(7, 30), T), WindowState::CLOSED);
    }

    #[test]
    fn start_is_inclusive_end_is_exclusive() {
        let window = SessionWindow::new(8.0, 17.0);
        let at_start = evaluate_window(&window, 8.0, T);
        assert_eq!(at_start.phase, WindowPhase::Open);
        assert_eq!(at_start.elapsed_secs, 0);
        assert_eq!(at_start.remaining_secs, 9 * 3600);
    }

    #[test]
    fn midnight_crossing_window() {
        let sydney = SessionWindow::new(21.0, 30.0);

        let state = evaluate_window(&sydney, 23.5, T);
        assert_eq!(state.phase, WindowPhase::Open);
        assert_eq!(state.elapsed_secs, 9000);
        assert_eq!(state.remaining_secs, 23400);

        let state = evaluate_window(&sydney, 3.0, T);
        assert_eq!(state.phase, WindowPhase::Open);
        assert_eq!(state.elapsed_secs, 6 * 3600);
        assert_eq!(state.remaining_secs, 3 * 3600);

        let state = evaluate_window(&sydney, 20.9, T);
        assert_eq!(state.phase, WindowPhase::Warning);
        assert_eq!(state.remaining_secs, -360);

        assert_eq!(evaluate_window(&sydney, 6.1, T), WindowState::CLOSED);
    }

    #[test]
    fn now_outside_day_is_wrapped() {
        let sydney = SessionWindow::new(21.0, 30.0);
        assert_eq!(evaluate_window(&sydney, 27.0, T), evaluate_window(&sydney, 3.0, T));
        assert_eq!(evaluate_window(&sydney, -1.0, T), evaluate_window(&sydney, 23.0, T));
    }

    #[test]
    fn pre_open_warning_wraps_midnight() {
        let tokyo = SessionWindow::new(0.0, 9.0);
        let state = evaluate_window(&tokyo, hm(23, 50), T);
        assert_eq!(state.phase, WindowPhase::Warning);
        assert_eq!(state.remaining_secs, -600);
    }

    #[test]
    fn custom_threshold() {
        let london = SessionWindow::new(8.0, 17.0);
        assert_eq!(evaluate_window(&london, 16.5, T).phase, WindowPhase::Open);
        assert_eq!(evaluate_window(&london, 16.5, 1.0).phase, WindowPhase::Warning);
        assert_eq!(evaluate_window(&london, 7.25, 1.0).remaining_secs, -2700);
    }

    #[test]
    fn evaluate_table() {
        let table = vec![
            SessionDefinition::new("London", SessionWindow::new(8.0, 17.0)).with_window(
                "killzone",
                WindowKind::Killzone,
                SessionWindow::new(7.0, 10.0).with_label("London Killzone"),
            ),
            SessionDefinition::new("Tokyo", SessionWindow::new(0.0, 9.0)),
        ];

        let (windows, sessions) = evaluate_all_windows(&table, 7.5, T);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[1].label, "London Killzone");
        assert_eq!(windows[1].state.phase, WindowPhase::Open);

        // Only main windows feed the per-session map
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[&SessionName::new("London")], WindowState::CLOSED);
        assert_eq!(sessions[&SessionName::new("Tokyo")].phase, WindowPhase::Open);
    }
}
