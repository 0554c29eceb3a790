//! Region-transition detection.
//!
//! The engine turns unreliable provider callbacks into a single
//! inside/outside determination per fence and emits exactly one
//! [`FenceTransition`] per confirmed crossing.
//!
//! # Key Concepts
//!
//! - **Sessions**: one [`MonitoringSession`] per monitored identifier, created
//!   on the provider's `started` callback
//! - **Polling**: entry fences ask for their state right after `started`,
//!   since a device already inside gets no entry callback; ambiguous answers
//!   are retried on a bounded budget and the fence is evicted when it runs out
//! - **Commands**: [`TransitionEngine::handle`] performs no I/O and returns
//!   [`EngineCommand`]s for the caller to execute
//!
//! Re-poll timers are identified by a ticket. A timer whose ticket is no
//! longer armed on a live session does nothing when it fires.
//!
//! # Example
//!
//! ```rust
//! use geofence::config::EngineConfig;
//! use geofence::engine::{EngineCommand, TransitionEngine};
//! use geofence::fence::{Coordinate, FenceRecord, TriggerOn};
//! use geofence::provider::{ProviderEvent, RegionState};
//!
//! let fences = vec![FenceRecord::new(
//!     "F1",
//!     Coordinate::new(35.0, 139.0),
//!     500.0,
//!     "Home",
//!     TriggerOn::OnEntry,
//! )];
//! let mut engine = TransitionEngine::new(EngineConfig::default());
//!
//! let commands = engine.handle(
//!     ProviderEvent::Started { identifier: "F1".into() }.into(),
//!     &fences,
//!     true,
//! );
//! assert_eq!(commands, vec![EngineCommand::RequestState { identifier: "F1".into() }]);
//!
//! let commands = engine.handle(
//!     ProviderEvent::StateDetermined { identifier: "F1".into(), state: RegionState::Inside }.into(),
//!     &fences,
//!     true,
//! );
//! assert!(matches!(&commands[..], [EngineCommand::Transition(t)] if t.is_inside));
//! ```

mod machine;
mod output;
mod session;

pub use machine::TransitionEngine;
pub use output::{
    EngineCommand, EngineInput, FenceLookup, FenceMonitoringFailed, FenceTransition,
};
pub use session::MonitoringSession;
