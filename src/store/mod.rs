//! Fence persistence.
//!
//! A store loads and saves the complete, ordered fence collection. It holds
//! no policy: callers decide when to save, and a store never merges or
//! diffs collections.
//!
//! # Example
//!
//! ```rust
//! use geofence::fence::{Coordinate, FenceRecord, TriggerOn};
//! use geofence::store::{FenceStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let fence = FenceRecord::new("F1", Coordinate::new(35.0, 139.0), 500.0, "Home", TriggerOn::OnEntry);
//!
//! store.save_all(&[fence.clone()]).unwrap();
//! assert_eq!(store.load_all().unwrap(), vec![fence]);
//! ```

mod codec;
pub mod error;
mod file;
mod memory;

pub use codec::{decode, encode, StoredFence};
pub use error::StoreError;
pub use file::{JsonFileStore, FENCES_KEY};
pub use memory::MemoryStore;

use crate::fence::FenceRecord;

/// Full-collection fence persistence.
pub trait FenceStore: Send + Sync {
    /// Load every persisted fence in insertion order.
    ///
    /// A store that has never been written returns an empty list.
    fn load_all(&self) -> Result<Vec<FenceRecord>, StoreError>;

    /// Replace the persisted collection.
    fn save_all(&self, fences: &[FenceRecord]) -> Result<(), StoreError>;

    /// Persist an empty collection.
    fn clear(&self) -> Result<(), StoreError> {
        self.save_all(&[])
    }
}
