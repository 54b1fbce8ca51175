//! Tooling for inspecting body arbitration.
//!
//! Engine-agnostic and allocation-light: the scheduler pushes one [`TraceEvent`] per decision and
//! tooling (CLI reports, tests, debug overlays) reads them back.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    LogTraceSink, NullTraceSink, TraceEvent, TraceKind, TraceLog, TraceSink, VecTraceSink,
};
