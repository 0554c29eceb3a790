//! Geofence: circular region monitoring with reconciled transitions
//!
//! Geofence keeps a persisted set of circular fences, registers them with a
//! platform region-monitoring provider, and turns the provider's unreliable
//! callbacks into exactly one user notification per confirmed crossing.
//!
//! The transition logic is a pure core: [`engine::TransitionEngine`] takes
//! provider events and timer firings and returns commands without doing any
//! I/O. [`service::GeoFenceService`] is the imperative shell that executes
//! those commands on a single serial event loop.
//!
//! # Core Concepts
//!
//! - **Fences**: [`fence::FenceRecord`] values owned by the [`registry::FenceRegistry`]
//! - **Sessions**: per-fence monitoring lifecycle tracked by the engine
//! - **Polling**: bounded re-queries while the provider's answer is ambiguous
//! - **Persistence**: the whole collection saved as one JSON document
//!
//! # Example
//!
//! ```rust
//! use geofence::config::GeoFenceConfig;
//! use geofence::fence::{Coordinate, TriggerOn};
//! use geofence::notify::RecordingSink;
//! use geofence::provider::{ProviderEvent, RegionState, SimulatedProvider};
//! use geofence::service::GeoFenceService;
//! use geofence::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), geofence::service::ServiceError> {
//! let provider = SimulatedProvider::new();
//! let sink = RecordingSink::new();
//! let service = GeoFenceService::new(
//!     GeoFenceConfig::default(),
//!     Arc::new(provider.clone()),
//!     Box::new(MemoryStore::new()),
//!     Arc::new(sink.clone()),
//! );
//! let (handle, _task) = service.start();
//!
//! let fence = handle
//!     .add(Coordinate::new(35.0, 139.0), 500.0, "Home", TriggerOn::OnEntry)
//!     .await?;
//! let id = fence.identifier().to_string();
//!
//! handle.deliver(ProviderEvent::Started { identifier: id.clone() })?;
//! handle.deliver(ProviderEvent::StateDetermined {
//!     identifier: id.clone(),
//!     state: RegionState::Inside,
//! })?;
//! handle.list().await?;
//!
//! assert_eq!(sink.bodies(), vec!["Home: IN".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod fence;
pub mod logging;
pub mod notify;
pub mod provider;
pub mod registry;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::GeoFenceConfig;
pub use engine::{EngineCommand, TransitionEngine};
pub use fence::{Coordinate, FenceRecord, TriggerOn};
pub use registry::{FenceRegistry, RegistryError};
pub use service::{GeoFenceService, ServiceHandle};
