//! In-memory fence store.

use super::codec;
use super::error::StoreError;
use super::FenceStore;
use crate::fence::FenceRecord;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Store that keeps the encoded collection in memory.
///
/// Clones share the same contents, so a test can hand one clone to the
/// service and inspect the other. Fences go through the same encoding as
/// the file store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<Option<Value>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already encoded collection.
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document))),
            fail_saves: Arc::new(Mutex::new(false)),
        }
    }

    /// The encoded collection, if anything has been saved.
    pub fn document(&self) -> Option<Value> {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Make subsequent saves fail, for exercising best-effort persistence.
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }
}

impl FenceStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<FenceRecord>, StoreError> {
        match self.document() {
            Some(document) => codec::decode(document),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, fences: &[FenceRecord]) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::SerializationFailed(
                "saves disabled".to_string(),
            ));
        }
        let encoded = codec::encode(fences)?;
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(encoded);
        Ok(())
    }
}
