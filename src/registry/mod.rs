//! The fence registry.
//!
//! Owns the ordered fence collection, registers fences with the provider,
//! and persists the whole collection after every change. Persistence is
//! best-effort: a failed save is logged and the in-memory change stands;
//! the next successful save catches the store up.

mod checks;
pub mod error;

pub use checks::{check_add, AddContext, AddViolation};
pub use error::RegistryError;

use crate::config::RegistryConfig;
use crate::engine::FenceLookup;
use crate::fence::{Coordinate, FenceRecord, TriggerOn};
use crate::provider::{RegionProvider, RegionSpec};
use crate::store::{FenceStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use stillwater::validation::Validation;

/// Ordered, identifier-unique fence collection bound to a provider and store.
pub struct FenceRegistry {
    fences: Vec<FenceRecord>,
    provider: Arc<dyn RegionProvider>,
    store: Box<dyn FenceStore>,
    config: RegistryConfig,
}

impl FenceRegistry {
    /// Create an empty registry. Call [`load_all`](Self::load_all) to
    /// restore persisted fences.
    pub fn new(
        provider: Arc<dyn RegionProvider>,
        store: Box<dyn FenceStore>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            fences: Vec::new(),
            provider,
            store,
            config,
        }
    }

    /// Replace the in-memory collection with the persisted one.
    ///
    /// Later duplicates of an identifier are dropped. Returns the number of
    /// fences loaded.
    pub fn load_all(&mut self) -> Result<usize, StoreError> {
        let loaded = self.store.load_all()?;
        let mut seen = HashSet::new();
        self.fences = loaded
            .into_iter()
            .filter(|fence| {
                let fresh = seen.insert(fence.identifier().to_string());
                if !fresh {
                    tracing::warn!(identifier = fence.identifier(), "Dropping duplicate stored fence");
                }
                fresh
            })
            .collect();
        tracing::info!(count = self.fences.len(), "Loaded fences");
        Ok(self.fences.len())
    }

    /// Save the full collection.
    pub fn persist_all(&self) -> Result<(), StoreError> {
        self.store.save_all(&self.fences)
    }

    fn persist_best_effort(&self) {
        if let Err(e) = self.persist_all() {
            tracing::warn!(error = %e, count = self.fences.len(), "Failed to persist fences");
        }
    }

    /// Limit a requested radius to what the provider can monitor.
    pub fn clamp_radius(&self, raw_radius: f64) -> f64 {
        raw_radius.min(self.provider.max_monitoring_distance())
    }

    /// Create, register, and persist a fence under a fresh identifier.
    pub fn add(
        &mut self,
        center: Coordinate,
        raw_radius: f64,
        note: impl Into<String>,
        trigger_on: TriggerOn,
    ) -> Result<FenceRecord, RegistryError> {
        let mut identifier = FenceRecord::generate_identifier();
        while self.find(&identifier).is_some() {
            identifier = FenceRecord::generate_identifier();
        }
        self.add_with_identifier(identifier, center, raw_radius, note, trigger_on)
    }

    /// Like [`add`](Self::add) with a caller-chosen identifier.
    ///
    /// Nothing is registered, stored, or kept when this returns an error.
    pub fn add_with_identifier(
        &mut self,
        identifier: impl Into<String>,
        center: Coordinate,
        raw_radius: f64,
        note: impl Into<String>,
        trigger_on: TriggerOn,
    ) -> Result<FenceRecord, RegistryError> {
        let identifier = identifier.into();
        let context = AddContext {
            supported: self.provider.is_monitoring_supported(),
            authorization: self.provider.authorization_level(),
            center,
            raw_radius,
        };
        if let Validation::Failure(violations) = check_add(&context) {
            let error = RegistryError::from(violations);
            tracing::info!(identifier = %identifier, error = %error, "Fence rejected");
            return Err(error);
        }
        if self.find(&identifier).is_some() {
            return Err(RegistryError::DuplicateIdentifier { identifier });
        }

        let radius = self.clamp_radius(raw_radius);
        let fence = FenceRecord::new(identifier, center, radius, note, trigger_on);

        self.provider.start_monitoring(&RegionSpec::from(&fence));
        self.fences.push(fence.clone());
        self.persist_best_effort();

        tracing::info!(
            identifier = fence.identifier(),
            radius,
            trigger = trigger_on.label(),
            "Fence added"
        );
        Ok(fence)
    }

    /// Stop monitoring and forget a fence. Unknown identifiers are a no-op.
    pub fn remove(&mut self, identifier: &str) -> Option<FenceRecord> {
        if self
            .provider
            .monitored_identifiers()
            .iter()
            .any(|monitored| monitored == identifier)
        {
            self.provider.stop_monitoring(identifier);
        }

        let index = self
            .fences
            .iter()
            .position(|fence| fence.identifier() == identifier)?;
        let removed = self.fences.remove(index);
        self.persist_best_effort();
        tracing::info!(identifier, "Fence removed");
        Some(removed)
    }

    /// Stop every monitored region and clear the collection.
    ///
    /// Returns the number of fences that were registered.
    pub fn remove_all(&mut self) -> usize {
        for identifier in self.provider.monitored_identifiers() {
            self.provider.stop_monitoring(&identifier);
        }
        let count = self.fences.len();
        self.fences.clear();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored fences");
        }
        tracing::info!(count, "All fences removed");
        count
    }

    pub fn find(&self, identifier: &str) -> Option<&FenceRecord> {
        self.fences
            .iter()
            .find(|fence| fence.identifier() == identifier)
    }

    /// Fences in insertion order.
    pub fn fences(&self) -> &[FenceRecord] {
        &self.fences
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    pub fn soft_cap(&self) -> usize {
        self.config.soft_cap
    }

    /// Whether the UI should still offer adding a fence.
    pub fn can_add_more(&self) -> bool {
        self.fences.len() < self.config.soft_cap
    }
}

impl FenceLookup for FenceRegistry {
    fn fence(&self, identifier: &str) -> Option<&FenceRecord> {
        self.find(identifier)
    }
}
