use embody_core::{BodyId, EnvironmentError, InfluenceError, ShapeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Influence(#[from] InfluenceError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("body {0:?} is already registered")]
    DuplicateBody(BodyId),

    #[error("body {0:?} is not part of the simulation")]
    UnknownBody(BodyId),
}

/// Structural problems in a scenario file, detected before anything is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("dt_seconds must be finite and positive, got {0}")]
    InvalidTimeStep(f32),

    #[error("world bounds are empty")]
    EmptyBounds,

    #[error("body id {0} is declared more than once")]
    DuplicateBody(u64),

    #[error("body {id}: {source}")]
    InvalidFrustum { id: u64, source: ShapeError },

    #[error("body {id} starts outside the world bounds")]
    OutOfBounds { id: u64 },

    #[error("body {id}: invalid agent, {reason}")]
    InvalidAgent { id: u64, reason: &'static str },

    #[error("event at tick {tick} targets undeclared body {id}")]
    UnknownEventBody { tick: u64, id: u64 },
}
