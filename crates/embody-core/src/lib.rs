//! Agent/body mediation core.
//!
//! Agents never touch the world. They perceive through a [`Body`], which asks the environment for
//! what lies in its [`Frustum`] and filters it, and they act by depositing [`Influence`]s on the
//! body, which decides per tick whether each one may reach the environment.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod body;
pub mod environment;
pub mod error;
pub mod frustum;
pub mod influence;
pub mod math;
pub mod perceivable;
pub mod policy;
pub mod rng;
pub mod tick;

pub use body::{
    Body, BodyConfig, BodyId, BodyState, Controllable, Liveness, Realization, Submission,
};
pub use environment::{EnvironmentMut, EnvironmentView};
pub use error::{EnvironmentError, InfluenceError, ShapeError};
pub use frustum::{Frustum, FrustumShape, Pose};
pub use influence::{
    ActionToken, Influence, InfluenceKind, InfluencePayload, PendingInfluences,
};
pub use math::{Aabb, Vec2};
pub use perceivable::{FilterCoverage, Perceivable, PerceivableKind, Perception, VisibilityMask};
pub use policy::{BodyPolicy, OccludedPolicy, ParalyzablePolicy, RejectionReason, StandardPolicy};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
