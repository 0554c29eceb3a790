//! In-process provider for tests and demos.

use super::{AuthorizationLevel, RegionProvider, RegionSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// A call made against the provider, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderCall {
    StartMonitoring(RegionSpec),
    StopMonitoring(String),
    RequestState(String),
    RequestAlwaysAuthorization,
}

#[derive(Debug)]
struct Inner {
    supported: bool,
    authorization: AuthorizationLevel,
    max_distance: f64,
    location_available: bool,
    monitored: BTreeMap<String, RegionSpec>,
    calls: Vec<ProviderCall>,
}

/// Provider that records calls and keeps a monitored-region table.
///
/// It never produces events by itself; tests feed [`super::ProviderEvent`]s
/// to the engine or service directly. Clones share state.
#[derive(Clone, Debug)]
pub struct SimulatedProvider {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// Supported, always-authorized, 400 km limit, location available.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                supported: true,
                authorization: AuthorizationLevel::AuthorizedAlways,
                max_distance: 400_000.0,
                location_available: true,
                monitored: BTreeMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_max_distance(self, meters: f64) -> Self {
        self.lock().max_distance = meters;
        self
    }

    pub fn with_authorization(self, level: AuthorizationLevel) -> Self {
        self.set_authorization(level);
        self
    }

    pub fn with_supported(self, supported: bool) -> Self {
        self.lock().supported = supported;
        self
    }

    pub fn set_authorization(&self, level: AuthorizationLevel) {
        self.lock().authorization = level;
    }

    pub fn set_location_available(&self, available: bool) {
        self.lock().location_available = available;
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Registration parameters of a monitored region.
    pub fn region(&self, identifier: &str) -> Option<RegionSpec> {
        self.lock().monitored.get(identifier).cloned()
    }

    pub fn request_state_count(&self, identifier: &str) -> usize {
        self.count(|call| matches!(call, ProviderCall::RequestState(id) if id == identifier))
    }

    pub fn stop_count(&self, identifier: &str) -> usize {
        self.count(|call| matches!(call, ProviderCall::StopMonitoring(id) if id == identifier))
    }

    fn count(&self, predicate: impl Fn(&ProviderCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }
}

impl RegionProvider for SimulatedProvider {
    fn is_monitoring_supported(&self) -> bool {
        self.lock().supported
    }

    fn authorization_level(&self) -> AuthorizationLevel {
        self.lock().authorization
    }

    fn request_always_authorization(&self) {
        self.lock().calls.push(ProviderCall::RequestAlwaysAuthorization);
    }

    fn max_monitoring_distance(&self) -> f64 {
        self.lock().max_distance
    }

    fn start_monitoring(&self, region: &RegionSpec) {
        let mut inner = self.lock();
        inner
            .monitored
            .insert(region.identifier.clone(), region.clone());
        inner.calls.push(ProviderCall::StartMonitoring(region.clone()));
    }

    fn stop_monitoring(&self, identifier: &str) {
        let mut inner = self.lock();
        inner.monitored.remove(identifier);
        inner
            .calls
            .push(ProviderCall::StopMonitoring(identifier.to_string()));
    }

    fn request_state(&self, identifier: &str) {
        self.lock()
            .calls
            .push(ProviderCall::RequestState(identifier.to_string()));
    }

    fn monitored_identifiers(&self) -> BTreeSet<String> {
        self.lock().monitored.keys().cloned().collect()
    }

    fn location_available(&self) -> bool {
        self.lock().location_available
    }
}
