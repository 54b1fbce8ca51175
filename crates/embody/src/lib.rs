//! Umbrella crate that re-exports the `embody-*` crates.
//!
//! `core` holds the body, its frustum, influences and policies; `tools` the arbitration trace;
//! `world` a reference sandbox with a tick scheduler and scenario files.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use embody_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use embody_tools as tools;

#[cfg(feature = "world")]
#[cfg_attr(docsrs, doc(cfg(feature = "world")))]
pub use embody_world as world;

#[cfg(feature = "core")]
pub mod prelude {
    pub use embody_core::{
        Body, BodyId, BodyPolicy, Controllable, EnvironmentMut, EnvironmentView, FrustumShape,
        Influence, Perceivable, PerceivableKind, Perception, Pose, Submission, Vec2,
    };
}
