//! Fence value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Display title for a fence whose note is empty.
pub const NO_NOTE_TITLE: &str = "No Note";

/// WGS84 coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Which boundary crossing a fence reports.
///
/// Persisted as an integer: `0` for entry, `1` for exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TriggerOn {
    OnEntry,
    OnExit,
}

/// Integer that does not name a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown trigger code {0}, expected 0 (entry) or 1 (exit)")]
pub struct InvalidTriggerCode(pub i64);

impl TriggerOn {
    pub fn code(self) -> i64 {
        match self {
            Self::OnEntry => 0,
            Self::OnExit => 1,
        }
    }

    /// Provider registration flag for entry events.
    pub fn notify_on_entry(self) -> bool {
        matches!(self, Self::OnEntry)
    }

    /// Provider registration flag for exit events.
    pub fn notify_on_exit(self) -> bool {
        matches!(self, Self::OnExit)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OnEntry => "On Entry",
            Self::OnExit => "On Exit",
        }
    }
}

impl TryFrom<i64> for TriggerOn {
    type Error = InvalidTriggerCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::OnEntry),
            1 => Ok(Self::OnExit),
            other => Err(InvalidTriggerCode(other)),
        }
    }
}

impl From<TriggerOn> for i64 {
    fn from(trigger: TriggerOn) -> Self {
        trigger.code()
    }
}

/// One circular fence.
///
/// The radius is expected to be clamped to the provider's maximum before
/// construction and never changes afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct FenceRecord {
    identifier: String,
    center: Coordinate,
    radius: f64,
    note: String,
    trigger_on: TriggerOn,
}

impl FenceRecord {
    pub fn new(
        identifier: impl Into<String>,
        center: Coordinate,
        radius: f64,
        note: impl Into<String>,
        trigger_on: TriggerOn,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            center,
            radius,
            note: note.into(),
            trigger_on,
        }
    }

    /// Fresh identifier in the upper-case hyphenated UUID form.
    pub fn generate_identifier() -> String {
        Uuid::new_v4().hyphenated().to_string().to_uppercase()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Radius in meters.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn trigger_on(&self) -> TriggerOn {
        self.trigger_on
    }

    /// Map callout title.
    pub fn title(&self) -> &str {
        if self.note.is_empty() {
            NO_NOTE_TITLE
        } else {
            &self.note
        }
    }

    /// Map callout subtitle, e.g. `Radius: 500m - On Entry`.
    pub fn subtitle(&self) -> String {
        format!("Radius: {}m - {}", self.radius, self.trigger_on.label())
    }
}
