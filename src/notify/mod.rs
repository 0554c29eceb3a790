//! User notifications.
//!
//! A transition is shown as a modal alert while the application is in the
//! foreground and as a system notification otherwise. Sinks are
//! fire-and-forget: nothing they do flows back into the engine.

mod sinks;

pub use sinks::{RecordingSink, TracingSink};

/// Sound name used for system notifications.
pub const DEFAULT_SOUND: &str = "default";

/// Body shown when the provider drops a fence registration.
pub const MONITORING_FAILED_BODY: &str = "Registration failed: please register the fence again";

/// How a notification reaches the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    /// Modal in-app alert.
    Alert,
    /// System-level notification.
    System,
}

/// A rendered notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub presentation: Presentation,
    pub title: Option<String>,
    pub body: String,
    pub sound: Option<String>,
}

impl Notification {
    /// Render a crossing: `"{note}: IN"` or `"{note}: OUT"`, untitled.
    pub fn transition(note: &str, is_inside: bool, is_foreground: bool) -> Self {
        let body = format!("{}: {}", note, if is_inside { "IN" } else { "OUT" });
        if is_foreground {
            Self {
                presentation: Presentation::Alert,
                title: None,
                body,
                sound: None,
            }
        } else {
            Self::system(body)
        }
    }

    /// Render a registration failure; always a system notification.
    pub fn monitoring_failed() -> Self {
        Self::system(MONITORING_FAILED_BODY.to_string())
    }

    fn system(body: String) -> Self {
        Self {
            presentation: Presentation::System,
            title: None,
            body,
            sound: Some(DEFAULT_SOUND.to_string()),
        }
    }
}

/// Destination for rendered notifications.
///
/// Implementors provide [`present`](NotificationSink::present); the other
/// methods render and forward. Failures must be handled inside the sink.
pub trait NotificationSink: Send + Sync {
    fn present(&self, notification: Notification);

    fn notify(&self, note: &str, is_inside: bool, is_foreground: bool) {
        self.present(Notification::transition(note, is_inside, is_foreground));
    }

    fn monitoring_failed(&self, identifier: &str) {
        tracing::debug!(identifier, "Presenting monitoring failure");
        self.present(Notification::monitoring_failed());
    }
}
