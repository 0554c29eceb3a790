//! Preconditions for adding a fence.
//!
//! Every check runs and all violations are collected with `Validation`, so a
//! rejected add reports everything wrong with it at once. The caller then
//! reduces them to one [`RegistryError`], most fundamental first.

use super::error::RegistryError;
use crate::fence::Coordinate;
use crate::provider::AuthorizationLevel;
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// One reason an add was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum AddViolation {
    Unsupported,
    Unauthorized { level: AuthorizationLevel },
    InvalidRadius { radius: f64 },
    InvalidCoordinate { center: Coordinate },
}

impl fmt::Display for AddViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "region monitoring unsupported"),
            Self::Unauthorized { level } => write!(f, "authorization is {level}"),
            Self::InvalidRadius { radius } => write!(f, "radius {radius} must be positive"),
            Self::InvalidCoordinate { center } => write!(f, "coordinate {center} out of range"),
        }
    }
}

/// Facts an add is checked against.
#[derive(Debug, Clone)]
pub struct AddContext {
    pub supported: bool,
    pub authorization: AuthorizationLevel,
    pub center: Coordinate,
    pub raw_radius: f64,
}

type Check = Validation<(), NonEmptyVec<AddViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> AddViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Run every precondition, accumulating all violations.
pub fn check_add(context: &AddContext) -> Check {
    let checks = vec![
        check(context.supported, || AddViolation::Unsupported),
        check(context.authorization.allows_monitoring(), || {
            AddViolation::Unauthorized {
                level: context.authorization,
            }
        }),
        check(
            context.raw_radius.is_finite() && context.raw_radius > 0.0,
            || AddViolation::InvalidRadius {
                radius: context.raw_radius,
            },
        ),
        check(context.center.is_valid(), || {
            AddViolation::InvalidCoordinate {
                center: context.center,
            }
        }),
    ];

    Validation::all_vec(checks).map(|_| ())
}

impl From<NonEmptyVec<AddViolation>> for RegistryError {
    fn from(violations: NonEmptyVec<AddViolation>) -> Self {
        let violations = violations.into_vec();
        if violations.contains(&AddViolation::Unsupported) {
            return RegistryError::Unsupported;
        }
        if let Some(level) = violations.iter().find_map(|v| match v {
            AddViolation::Unauthorized { level } => Some(*level),
            _ => None,
        }) {
            return RegistryError::Unauthorized { level };
        }
        RegistryError::InvalidFence {
            reasons: violations.iter().map(ToString::to_string).collect(),
        }
    }
}
