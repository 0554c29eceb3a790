//! Core session types for the transition state machine.
//!
//! This module contains the value types the engine moves through:
//! - Session phases and the inside/outside presence tri-state
//! - Timestamped phase history per session
//!
//! Nothing here performs I/O.

mod history;
mod state;

pub use history::{PhaseChange, PhaseHistory};
pub use state::{Presence, SessionPhase};
