//! Phase history of a monitoring session.
//!
//! Every phase change a session goes through is recorded with a timestamp
//! and the event that caused it, so a session can be inspected after the
//! fact (for example when deciding why a fence was evicted).

use super::state::SessionPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single phase change.
///
/// # Example
///
/// ```rust
/// use geofence::core::{PhaseChange, SessionPhase};
/// use chrono::Utc;
///
/// let change = PhaseChange {
///     from: SessionPhase::Unmonitored,
///     to: SessionPhase::Polling,
///     timestamp: Utc::now(),
///     cause: "started".to_string(),
/// };
/// assert_eq!(change.to, SessionPhase::Polling);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// The phase being left
    pub from: SessionPhase,
    /// The phase being entered
    pub to: SessionPhase,
    /// When the change occurred
    pub timestamp: DateTime<Utc>,
    /// Name of the event that caused the change
    pub cause: String,
}

/// Ordered history of phase changes for one session.
///
/// # Example
///
/// ```rust
/// use geofence::core::{PhaseChange, PhaseHistory, SessionPhase};
/// use chrono::Utc;
///
/// let mut history = PhaseHistory::new();
/// history.record(PhaseChange {
///     from: SessionPhase::Unmonitored,
///     to: SessionPhase::Polling,
///     timestamp: Utc::now(),
///     cause: "started".to_string(),
/// });
/// history.record(PhaseChange {
///     from: SessionPhase::Polling,
///     to: SessionPhase::Steady,
///     timestamp: Utc::now(),
///     cause: "state_determined".to_string(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // Unmonitored -> Polling -> Steady
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseHistory {
    changes: Vec<PhaseChange>,
}

impl PhaseHistory {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Append a phase change.
    pub fn record(&mut self, change: PhaseChange) {
        self.changes.push(change);
    }

    /// Get the path of phases traversed.
    ///
    /// Returns the initial phase followed by the `to` phase of each change.
    pub fn get_path(&self) -> Vec<SessionPhase> {
        let mut path = Vec::with_capacity(self.changes.len() + 1);
        if let Some(first) = self.changes.first() {
            path.push(first.from);
        }
        path.extend(self.changes.iter().map(|change| change.to));
        path
    }

    /// Time between the first and last recorded change.
    ///
    /// Returns `None` if nothing has been recorded.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.changes.first(), self.changes.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn changes(&self) -> &[PhaseChange] {
        &self.changes
    }

    pub fn last(&self) -> Option<&PhaseChange> {
        self.changes.last()
    }
}
