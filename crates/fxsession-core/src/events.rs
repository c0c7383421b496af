//! Core events emitted by the engine

use fxsession_api::{Notification, TableVariant};

use crate::FiredAlert;

/// Events emitted by the session engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Effective session table changed (DST transition or override)
    TableSwitched {
        from: TableVariant,
        to: TableVariant,
    },

    /// Alert became due and was recorded in the dedupe set
    AlertFired {
        alert: FiredAlert,
        notification: Notification,
    },

    /// Policy was reloaded
    PolicyReloaded {
        session_count: usize,
    },
}
