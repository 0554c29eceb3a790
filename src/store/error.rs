//! Fence store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving fences
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Fence store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding fences to the persisted format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The persisted document could not be parsed at all
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}
