//! Notification sink implementations.

use super::{Notification, NotificationSink, Presentation};
use std::sync::{Arc, Mutex};

/// Sink that writes notifications to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn present(&self, notification: Notification) {
        match notification.presentation {
            Presentation::Alert => tracing::info!(body = %notification.body, "Alert"),
            Presentation::System => tracing::info!(
                body = %notification.body,
                sound = notification.sound.as_deref().unwrap_or(""),
                "System notification"
            ),
        }
    }
}

/// Sink that keeps every notification; clones share the record.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Bodies of delivered notifications, in order.
    pub fn bodies(&self) -> Vec<String> {
        self.delivered().into_iter().map(|n| n.body).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn present(&self, notification: Notification) {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}
