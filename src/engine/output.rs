//! Engine inputs and the commands it asks the caller to carry out.

use crate::fence::FenceRecord;
use crate::provider::ProviderEvent;
use std::time::Duration;

/// Something the engine reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineInput {
    /// A provider callback.
    Provider(ProviderEvent),

    /// A scheduled re-poll timer fired.
    PollDue { identifier: String, ticket: u64 },
}

impl From<ProviderEvent> for EngineInput {
    fn from(event: ProviderEvent) -> Self {
        Self::Provider(event)
    }
}

/// Confirmed boundary crossing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenceTransition {
    pub identifier: String,
    pub note: String,
    pub is_inside: bool,
}

/// The provider could not keep a fence registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenceMonitoringFailed {
    pub identifier: String,
    /// Note of the fence, when the fence is known.
    pub note: Option<String>,
    pub error: String,
}

/// Side effect requested by the engine.
///
/// The engine never performs I/O itself; its caller executes these in the
/// order returned.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    /// Call `RegionProvider::request_state` now.
    RequestState { identifier: String },

    /// Feed `EngineInput::PollDue { identifier, ticket }` back after `delay`.
    SchedulePoll {
        identifier: String,
        delay: Duration,
        ticket: u64,
    },

    /// Drop any pending re-poll timer for the identifier.
    CancelPoll { identifier: String },

    /// Call `RegionProvider::stop_monitoring`.
    StopMonitoring { identifier: String },

    /// The fence was unregistered after its poll budget ran out.
    Evicted { identifier: String },

    /// Notify the user.
    Transition(FenceTransition),

    /// Tell the user the fence must be registered again.
    MonitoringFailed(FenceMonitoringFailed),
}

/// Read access to the fence collection.
pub trait FenceLookup {
    fn fence(&self, identifier: &str) -> Option<&FenceRecord>;
}

impl FenceLookup for [FenceRecord] {
    fn fence(&self, identifier: &str) -> Option<&FenceRecord> {
        self.iter().find(|fence| fence.identifier() == identifier)
    }
}

impl FenceLookup for Vec<FenceRecord> {
    fn fence(&self, identifier: &str) -> Option<&FenceRecord> {
        self.as_slice().fence(identifier)
    }
}
