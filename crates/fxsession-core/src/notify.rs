//! Notification sink trait and an in-memory sink for testing

use fxsession_api::Notification;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::FiredAlert;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Receiver of fired session alerts (desktop notifications, sound, push).
///
/// A delivery failure does not un-fire the alert: it stays recorded in the
/// dedupe set and is not retried.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, alert: &FiredAlert, notification: &Notification) -> NotifyResult<()>;
}

/// Sink that keeps every notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    received: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Notifications received so far
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, _alert: &FiredAlert, notification: &Notification) -> NotifyResult<()> {
        if self.fail {
            return Err(NotifyError::DeliveryFailed("recording sink set to fail".into()));
        }
        self.received
            .lock()
            .map_err(|_| NotifyError::Unavailable("recording sink poisoned".into()))?
            .push(notification.clone());
        Ok(())
    }
}
