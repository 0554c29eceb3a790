//! Phase and presence values for a monitoring session.
//!
//! Both types are plain values with pure inspection methods. They carry no
//! behaviour of their own; the transition engine decides when a session
//! moves between phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the per-fence monitoring state machine.
///
/// ```text
/// Unmonitored -> Starting -> Steady <-> Polling -> Unmonitored (evicted)
///                                              -> Steady (resolved)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session exists for the identifier.
    #[default]
    Unmonitored,

    /// Monitoring was requested; waiting for the provider's `started` callback.
    Starting,

    /// Monitoring is active and the engine reacts to enter/exit callbacks.
    Steady,

    /// A state request is outstanding or a re-poll is scheduled.
    Polling,
}

impl SessionPhase {
    /// Name for display and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unmonitored => "Unmonitored",
            Self::Starting => "Starting",
            Self::Steady => "Steady",
            Self::Polling => "Polling",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last authoritative inside/outside determination for a fence.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Presence {
    /// No determination yet.
    #[default]
    Unknown,
    Inside,
    Outside,
}

impl Presence {
    pub fn from_inside(is_inside: bool) -> Self {
        if is_inside {
            Self::Inside
        } else {
            Self::Outside
        }
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, Self::Inside)
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Inside => f.write_str("inside"),
            Self::Outside => f.write_str("outside"),
        }
    }
}
