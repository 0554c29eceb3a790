//! Region-monitoring provider interface.
//!
//! The provider is the platform service that actually watches circular
//! regions. It is driven through [`RegionProvider`] and reports back through
//! [`ProviderEvent`]s, all keyed by fence identifier. Point-in-circle
//! decisions are entirely the provider's.

mod simulated;

pub use simulated::{ProviderCall, SimulatedProvider};

use crate::fence::{Coordinate, FenceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Location permission granted to the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthorizationLevel {
    #[default]
    NotDetermined,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationLevel {
    /// Region monitoring needs background ("always") access.
    pub fn allows_monitoring(self) -> bool {
        matches!(self, Self::AuthorizedAlways)
    }
}

impl fmt::Display for AuthorizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotDetermined => "not determined",
            Self::Denied => "denied",
            Self::AuthorizedAlways => "authorized always",
            Self::AuthorizedWhenInUse => "authorized when in use",
        };
        f.write_str(name)
    }
}

/// Answer to a state request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionState {
    Inside,
    Outside,
    /// The provider could not decide, typically for lack of a good fix.
    Unknown,
}

/// Registration parameters handed to the provider.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionSpec {
    pub identifier: String,
    pub center: Coordinate,
    pub radius: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

impl From<&FenceRecord> for RegionSpec {
    fn from(fence: &FenceRecord) -> Self {
        Self {
            identifier: fence.identifier().to_string(),
            center: fence.center(),
            radius: fence.radius(),
            notify_on_entry: fence.trigger_on().notify_on_entry(),
            notify_on_exit: fence.trigger_on().notify_on_exit(),
        }
    }
}

/// Callback from the provider.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderEvent {
    Started {
        identifier: String,
    },
    Entered {
        identifier: String,
    },
    Exited {
        identifier: String,
    },
    StateDetermined {
        identifier: String,
        state: RegionState,
    },
    MonitoringFailed {
        identifier: String,
        error: String,
    },
    AuthorizationChanged {
        level: AuthorizationLevel,
    },
    /// Provider-level failure not tied to a region.
    Failed {
        error: String,
    },
}

impl ProviderEvent {
    /// Event name for logging and phase history.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Entered { .. } => "entered",
            Self::Exited { .. } => "exited",
            Self::StateDetermined { .. } => "state_determined",
            Self::MonitoringFailed { .. } => "monitoring_failed",
            Self::AuthorizationChanged { .. } => "authorization_changed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Started { identifier }
            | Self::Entered { identifier }
            | Self::Exited { identifier }
            | Self::StateDetermined { identifier, .. }
            | Self::MonitoringFailed { identifier, .. } => Some(identifier),
            Self::AuthorizationChanged { .. } | Self::Failed { .. } => None,
        }
    }

    /// Events whose meaning depends on a current location fix.
    pub fn needs_location(&self) -> bool {
        matches!(
            self,
            Self::Entered { .. } | Self::Exited { .. } | Self::StateDetermined { .. }
        )
    }
}

/// Platform region-monitoring service.
///
/// Every call is fire-and-forget; outcomes arrive later as
/// [`ProviderEvent`]s.
pub trait RegionProvider: Send + Sync {
    fn is_monitoring_supported(&self) -> bool;

    fn authorization_level(&self) -> AuthorizationLevel;

    fn request_always_authorization(&self);

    /// Largest radius the provider accepts, in meters.
    fn max_monitoring_distance(&self) -> f64;

    fn start_monitoring(&self, region: &RegionSpec);

    fn stop_monitoring(&self, identifier: &str);

    /// Ask for the current state; answered by `StateDetermined`.
    fn request_state(&self, identifier: &str);

    fn monitored_identifiers(&self) -> BTreeSet<String>;

    /// Whether the device currently has a location fix.
    fn location_available(&self) -> bool;
}
