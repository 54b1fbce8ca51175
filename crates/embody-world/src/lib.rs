//! Reference world for `embody-core`: a bounded 2D sandbox, a few agents, a tick scheduler and
//! YAML scenario loading.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agents;
pub mod config;
pub mod error;
pub mod percept;
pub mod sandbox;
pub mod simulation;
pub mod ticked;
pub mod variant;

pub use agents::{Agent, FnAgent, IdleAgent, SeekAgent, WanderAgent};
pub use config::{
    AgentDecl, BodyDecl, EventAction, ObjectDecl, PolicyDecl, Scenario, ScenarioConfig,
    ScheduledEvent, WorldConfig,
};
pub use error::{ScenarioError, SimulationError};
pub use percept::{Percept, PerceptId};
pub use sandbox::{ActionRecord, SandboxWorld};
pub use simulation::{BodyTickReport, RunSummary, Simulation, TickReport};
pub use ticked::TickedEnvironment;
pub use variant::BodyVariant;
