//! Scenario files.
//!
//! A scenario describes the sandbox (bounds, walls, objects), the bodies living in it with their
//! frustum, policy and agent, and an optional list of scheduled liveness/paralysis events.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use embody_core::{
    Aabb, Body, BodyConfig, BodyId, FrustumShape, OccludedPolicy, ParalyzablePolicy, Pose,
    StandardPolicy, Vec2,
};

use crate::{
    Agent, BodyVariant, IdleAgent, Percept, RunSummary, SandboxWorld, ScenarioError, SeekAgent,
    Simulation, SimulationError, WanderAgent,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,

    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f32,

    /// Ticks to run when the caller does not override it.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    pub world: WorldConfig,

    pub bodies: Vec<BodyDecl>,

    pub events: Vec<ScheduledEvent>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dt_seconds: default_dt_seconds(),
            ticks: default_ticks(),
            world: WorldConfig::default(),
            bodies: Vec::new(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    #[serde(default = "default_bounds")]
    pub bounds: Aabb,

    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    pub walls: Vec<Aabb>,

    pub objects: Vec<ObjectDecl>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: default_bounds(),
            max_speed: default_max_speed(),
            walls: Vec::new(),
            objects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub position: Vec2,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDecl {
    pub id: u64,
    pub position: Vec2,

    #[serde(default)]
    pub heading: f32,

    #[serde(default = "default_frustum")]
    pub frustum: FrustumShape,

    #[serde(default)]
    pub policy: PolicyDecl,

    #[serde(default = "default_hide_dead_bodies")]
    pub hide_dead_bodies: bool,

    /// Overrides `world.max_speed` for this body.
    #[serde(default)]
    pub max_speed: Option<f32>,

    #[serde(default)]
    pub agent: AgentDecl,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyDecl {
    #[default]
    Standard,
    Occluded {
        #[serde(default)]
        clear_sight_range: Option<f32>,
        /// Treat the world walls as known occluders.
        #[serde(default = "default_true")]
        world_walls: bool,
    },
    Paralyzable {
        #[serde(default)]
        clear_sight_range: Option<f32>,
        #[serde(default = "default_true")]
        world_walls: bool,
        #[serde(default)]
        allowed_while_paralyzed: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentDecl {
    #[default]
    Idle,
    Wander {
        #[serde(default = "default_wander_speed")]
        speed: f32,
        #[serde(default = "default_turn_rate")]
        turn_rate: f32,
    },
    Seek {
        #[serde(default = "default_seek_acceleration")]
        acceleration: f32,
        #[serde(default = "default_arrive_radius")]
        arrive_radius: f32,
        action: String,
    },
}

/// Applied before the tick with the same number runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub tick: u64,
    pub body: u64,
    pub action: EventAction,
    /// Duration for `paralyze`.
    #[serde(default)]
    pub ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Kill,
    Revive,
    Paralyze,
}

fn default_dt_seconds() -> f32 {
    0.1
}
fn default_ticks() -> u64 {
    100
}
fn default_bounds() -> Aabb {
    Aabb::new(Vec2::new(-50.0, -50.0), Vec2::new(50.0, 50.0))
}
fn default_max_speed() -> f32 {
    5.0
}
fn default_frustum() -> FrustumShape {
    FrustumShape::Circle { range: 10.0 }
}
fn default_hide_dead_bodies() -> bool {
    BodyConfig::default().hide_dead_bodies
}
fn default_true() -> bool {
    true
}
fn default_wander_speed() -> f32 {
    1.0
}
fn default_turn_rate() -> f32 {
    0.5
}
fn default_seek_acceleration() -> f32 {
    2.0
}
fn default_arrive_radius() -> f32 {
    0.5
}

impl ScenarioConfig {
    /// Load and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.dt_seconds.is_finite() && self.dt_seconds > 0.0) {
            return Err(ScenarioError::InvalidTimeStep(self.dt_seconds));
        }
        let bounds = self.world.bounds;
        if bounds.min.x >= bounds.max.x || bounds.min.y >= bounds.max.y {
            return Err(ScenarioError::EmptyBounds);
        }

        let mut seen = BTreeSet::new();
        for decl in &self.bodies {
            if !seen.insert(decl.id) {
                return Err(ScenarioError::DuplicateBody(decl.id));
            }
            decl.frustum
                .validate()
                .map_err(|source| ScenarioError::InvalidFrustum {
                    id: decl.id,
                    source,
                })?;
            if !bounds.contains(decl.position) {
                return Err(ScenarioError::OutOfBounds { id: decl.id });
            }
            decl.agent
                .validate()
                .map_err(|reason| ScenarioError::InvalidAgent {
                    id: decl.id,
                    reason,
                })?;
        }
        for event in &self.events {
            if !seen.contains(&event.body) {
                return Err(ScenarioError::UnknownEventBody {
                    tick: event.tick,
                    id: event.body,
                });
            }
        }
        Ok(())
    }

    /// Build the world and the simulation. Validates first.
    pub fn build(&self) -> Result<Scenario> {
        self.validate()?;

        let mut world = SandboxWorld::new(self.world.bounds, self.world.max_speed);
        for wall in &self.world.walls {
            world.add_wall(*wall);
        }
        for object in &self.world.objects {
            world.add_object(object.position, object.label.clone());
        }

        let mut simulation: Simulation<SandboxWorld> =
            Simulation::new(world, self.dt_seconds, self.seed);
        for decl in &self.bodies {
            let id = BodyId(decl.id);
            let pose = Pose::new(decl.position, decl.heading);
            let max_speed = decl.max_speed.unwrap_or(self.world.max_speed);
            simulation
                .world_mut()
                .spawn_body_with_speed(id, pose, max_speed);

            let body = Body::new(id, pose, decl.frustum, self.policy_for(&decl.policy))?
                .with_config(BodyConfig {
                    hide_dead_bodies: decl.hide_dead_bodies,
                });
            simulation.add_body(body, decl.agent.build())?;
        }

        let mut events: BTreeMap<u64, Vec<ScheduledEvent>> = BTreeMap::new();
        for event in &self.events {
            events.entry(event.tick).or_default().push(event.clone());
        }

        tracing::info!(
            bodies = self.bodies.len(),
            walls = self.world.walls.len(),
            objects = self.world.objects.len(),
            seed = self.seed,
            "scenario built"
        );
        Ok(Scenario { simulation, events })
    }

    fn policy_for(&self, decl: &PolicyDecl) -> BodyVariant {
        let occluded = |clear_sight_range: Option<f32>, world_walls: bool| {
            let mut policy = if world_walls {
                OccludedPolicy::with_occluders(self.world.walls.iter().copied())
            } else {
                OccludedPolicy::new()
            };
            if let Some(range) = clear_sight_range {
                policy = policy.clear_sight_range(range);
            }
            policy
        };

        match decl {
            PolicyDecl::Standard => BodyVariant::Standard(StandardPolicy),
            PolicyDecl::Occluded {
                clear_sight_range,
                world_walls,
            } => BodyVariant::Occluded(occluded(*clear_sight_range, *world_walls)),
            PolicyDecl::Paralyzable {
                clear_sight_range,
                world_walls,
                allowed_while_paralyzed,
            } => {
                let policy = allowed_while_paralyzed.iter().fold(
                    ParalyzablePolicy::wrap(occluded(*clear_sight_range, *world_walls)),
                    |policy, token| policy.allow_while_paralyzed(token.clone()),
                );
                BodyVariant::Paralyzable(policy)
            }
        }
    }
}

impl AgentDecl {
    /// Parameter checks that would otherwise only fail on the agent's first submission.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self {
            AgentDecl::Idle => Ok(()),
            AgentDecl::Wander { speed, turn_rate } => {
                if !speed.is_finite() {
                    return Err("wander speed must be finite");
                }
                if !turn_rate.is_finite() {
                    return Err("wander turn_rate must be finite");
                }
                Ok(())
            }
            AgentDecl::Seek {
                acceleration,
                arrive_radius,
                action,
            } => {
                if !acceleration.is_finite() {
                    return Err("seek acceleration must be finite");
                }
                if !(arrive_radius.is_finite() && *arrive_radius >= 0.0) {
                    return Err("seek arrive_radius must be finite and non-negative");
                }
                if action.is_empty() {
                    return Err("seek action must not be empty");
                }
                Ok(())
            }
        }
    }

    pub fn build(&self) -> Box<dyn Agent<Percept>> {
        match self {
            AgentDecl::Idle => Box::new(IdleAgent),
            AgentDecl::Wander { speed, turn_rate } => Box::new(WanderAgent::new(*speed, *turn_rate)),
            AgentDecl::Seek {
                acceleration,
                arrive_radius,
                action,
            } => Box::new(SeekAgent::new(*acceleration, *arrive_radius, action.clone())),
        }
    }
}

/// A built scenario: the simulation plus its pending scheduled events.
pub struct Scenario {
    pub simulation: Simulation<SandboxWorld>,
    events: BTreeMap<u64, Vec<ScheduledEvent>>,
}

impl Scenario {
    /// Run `ticks` ticks, applying scheduled events at the start of their tick.
    pub fn run(&mut self, ticks: u64) -> Result<RunSummary, SimulationError> {
        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            self.apply_events()?;
            summary.record(self.simulation.step()?);
        }
        summary.alive = self.simulation.alive_count();
        Ok(summary)
    }

    fn apply_events(&mut self) -> Result<(), SimulationError> {
        let tick = self.simulation.context().tick;
        let Some(events) = self.events.remove(&tick) else {
            return Ok(());
        };
        for event in events {
            let id = BodyId(event.body);
            match event.action {
                EventAction::Kill => {
                    self.simulation.kill(id)?;
                }
                EventAction::Revive => {
                    self.simulation.revive(id)?;
                }
                EventAction::Paralyze => {
                    if !self.simulation.paralyze(id, event.ticks)? {
                        tracing::warn!(
                            body = event.body,
                            "paralyze event on a body that cannot be paralyzed"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
