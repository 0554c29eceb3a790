//! Fence data model.
//!
//! A fence is a circle (center plus radius in meters) with a display note
//! and the single boundary crossing it reports.

mod record;

pub use record::{Coordinate, FenceRecord, InvalidTriggerCode, TriggerOn, NO_NOTE_TITLE};
