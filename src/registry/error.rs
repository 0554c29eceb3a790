//! Registry error types.

use crate::provider::AuthorizationLevel;
use thiserror::Error;

/// Errors that can occur when adding a fence
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The device cannot monitor regions at all
    #[error("Region monitoring is not available on this device")]
    Unsupported,

    /// Location permission is insufficient for background monitoring
    #[error("Location access is {level}; enable \"always\" location access in settings")]
    Unauthorized { level: AuthorizationLevel },

    /// Radius or coordinate are unusable
    #[error("Invalid fence: {}", reasons.join("; "))]
    InvalidFence { reasons: Vec<String> },

    /// A fence with this identifier is already registered
    #[error("Fence {identifier} already exists")]
    DuplicateIdentifier { identifier: String },
}
