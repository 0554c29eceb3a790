//! Service error types.

use crate::registry::RegistryError;
use thiserror::Error;

/// Errors returned through a [`super::ServiceHandle`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The service loop has exited
    #[error("Geofence service is not running")]
    Stopped,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
