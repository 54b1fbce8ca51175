use thiserror::Error;

use crate::{BodyId, InfluenceKind};

/// Malformed influence construction. Never reaches a pending set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InfluenceError {
    #[error("invalid {kind:?} influence: {reason}")]
    InvalidInfluence {
        kind: InfluenceKind,
        reason: &'static str,
    },
}

/// Invalid frustum shape parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("frustum range must be finite and non-negative, got {0}")]
    InvalidRange(f32),

    #[error("cone half-aperture must lie in (0, pi], got {0}")]
    InvalidAperture(f32),

    #[error("rect half-extents must be finite and non-negative, got ({x}, {y})")]
    InvalidExtents { x: f32, y: f32 },
}

/// Faults raised by an environment. These are programming errors on the caller side
/// (e.g. querying for a body the environment never registered) and are not retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvironmentError {
    #[error("body {0:?} is not registered with the environment")]
    UnknownBody(BodyId),

    #[error("environment could not realize influences for {body:?}: {reason}")]
    Realization { body: BodyId, reason: String },
}
