//! Tick scheduler.
//!
//! One [`Simulation::step`] runs the phases in a fixed order:
//!
//! 1. the environment opens the tick,
//! 2. every body perceives (read-only, against the same world state),
//! 3. every agent decides from its own perception and submits influences,
//! 4. every body realizes its pending set, one after the other,
//! 5. the environment commits (integrates motion),
//! 6. bodies pick up their new pose and their policy sees the tick boundary.
//!
//! Bodies are visited in [`BodyId`] order in every phase, so a run is fully determined by the
//! scenario and its seed.

use std::collections::BTreeMap;

use serde::Serialize;

use embody_core::{
    ActionToken, Body, BodyId, BodyPolicy, Controllable, InfluenceError, Perceivable, Perception,
    Pose, Submission, TickContext, Vec2,
};
use embody_tools::{LogTraceSink, TraceEvent, TraceKind, TraceSink};

use crate::{Agent, BodyVariant, SimulationError, TickedEnvironment};

struct Slot<P: Perceivable, S: BodyPolicy<P>> {
    body: Body<P, S>,
    agent: Box<dyn Agent<P>>,
}

/// Per-body outcome of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyTickReport {
    pub id: BodyId,
    pub alive: bool,
    pub position: Vec2,
    pub perceived: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub realized: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub bodies: Vec<BodyTickReport>,
}

impl TickReport {
    pub fn body(&self, id: BodyId) -> Option<&BodyTickReport> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn total_realized(&self) -> usize {
        self.bodies.iter().map(|b| b.realized).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.bodies.iter().map(|b| b.rejected).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub realized: usize,
    pub rejected: usize,
    pub discarded: usize,
    /// Bodies alive after the last tick.
    pub alive: usize,
    pub reports: Vec<TickReport>,
}

impl RunSummary {
    pub fn record(&mut self, report: TickReport) {
        self.ticks += 1;
        for body in &report.bodies {
            self.realized += body.realized;
            self.rejected += body.rejected;
            self.discarded += body.discarded;
        }
        self.reports.push(report);
    }
}

pub struct Simulation<E, S = BodyVariant, T = LogTraceSink>
where
    E: TickedEnvironment,
    S: BodyPolicy<E::Perceivable>,
    T: TraceSink,
{
    world: E,
    slots: BTreeMap<BodyId, Slot<E::Perceivable, S>>,
    ctx: TickContext,
    trace: T,
}

impl<E, S> Simulation<E, S, LogTraceSink>
where
    E: TickedEnvironment,
    S: BodyPolicy<E::Perceivable>,
{
    pub fn new(world: E, dt_seconds: f32, seed: u64) -> Self {
        Self::with_trace(world, dt_seconds, seed, LogTraceSink)
    }
}

impl<E, S, T> Simulation<E, S, T>
where
    E: TickedEnvironment,
    S: BodyPolicy<E::Perceivable>,
    T: TraceSink,
{
    pub fn with_trace(world: E, dt_seconds: f32, seed: u64, trace: T) -> Self {
        Self {
            world,
            slots: BTreeMap::new(),
            ctx: TickContext::new(0, dt_seconds, seed),
            trace,
        }
    }

    pub fn world(&self) -> &E {
        &self.world
    }

    /// Direct world access for scenario setup between ticks.
    pub fn world_mut(&mut self) -> &mut E {
        &mut self.world
    }

    pub fn trace(&self) -> &T {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut T {
        &mut self.trace
    }

    /// The context the next [`Self::step`] will run with.
    pub fn context(&self) -> TickContext {
        self.ctx
    }

    pub fn body(&self, id: BodyId) -> Option<&Body<E::Perceivable, S>> {
        self.slots.get(&id).map(|slot| &slot.body)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body<E::Perceivable, S>> {
        self.slots.get_mut(&id).map(|slot| &mut slot.body)
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.slots.values().filter(|s| s.body.is_alive()).count()
    }

    /// Attach a body to a world entity with the same id and hand it to `agent`.
    ///
    /// The body's pose is taken from the world, which stays authoritative.
    pub fn add_body(
        &mut self,
        mut body: Body<E::Perceivable, S>,
        agent: Box<dyn Agent<E::Perceivable>>,
    ) -> Result<(), SimulationError> {
        let id = body.id();
        if self.slots.contains_key(&id) {
            return Err(SimulationError::DuplicateBody(id));
        }
        let pose = self.world.pose(id).ok_or(SimulationError::UnknownBody(id))?;
        body.set_pose(pose);
        self.world.set_alive(id, body.is_alive())?;
        self.slots.insert(id, Slot { body, agent });
        Ok(())
    }

    /// Returns `Ok(false)` if the body was already dead.
    pub fn kill(&mut self, id: BodyId) -> Result<bool, SimulationError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(SimulationError::UnknownBody(id))?;
        let changed = slot.body.kill();
        self.world.set_alive(id, false)?;
        if changed {
            self.trace
                .emit(TraceEvent::new(self.ctx.tick, id, TraceKind::Killed));
        }
        Ok(changed)
    }

    /// Returns `Ok(false)` if the body was already alive.
    pub fn revive(&mut self, id: BodyId) -> Result<bool, SimulationError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(SimulationError::UnknownBody(id))?;
        let changed = slot.body.revive();
        self.world.set_alive(id, true)?;
        if changed {
            self.trace
                .emit(TraceEvent::new(self.ctx.tick, id, TraceKind::Revived));
        }
        Ok(changed)
    }

    pub fn step(&mut self) -> Result<TickReport, SimulationError> {
        let ctx = self.ctx;
        let span = tracing::debug_span!("tick", tick = ctx.tick);
        let _guard = span.enter();

        self.world.begin_tick(&ctx);

        let mut reports: BTreeMap<BodyId, BodyTickReport> = BTreeMap::new();
        let mut perceptions: Vec<Perception<E::Perceivable>> = Vec::with_capacity(self.slots.len());
        for (id, slot) in &self.slots {
            let perception = slot.body.perceive(&self.world)?;
            if slot.body.is_alive() {
                self.trace.emit(
                    TraceEvent::new(ctx.tick, *id, TraceKind::Perceived)
                        .with_count(perception.len() as u64),
                );
                if !perception.coverage.is_complete() {
                    self.trace
                        .emit(TraceEvent::new(ctx.tick, *id, TraceKind::PerceptionPartial));
                }
            }
            reports.insert(
                *id,
                BodyTickReport {
                    id: *id,
                    alive: slot.body.is_alive(),
                    position: slot.body.pose().position,
                    perceived: perception.len(),
                    accepted: 0,
                    duplicates: 0,
                    rejected: 0,
                    realized: 0,
                    discarded: 0,
                },
            );
            perceptions.push(perception);
        }

        // An aborted tick must not leave influences behind for the next one.
        let phases = self
            .decide_all(&ctx, &perceptions, &mut reports)
            .and_then(|()| self.realize_all(&ctx, &mut reports));
        if let Err(err) = phases {
            self.discard_all_pending(&ctx);
            return Err(err);
        }

        self.world.commit(&ctx)?;

        for (id, slot) in self.slots.iter_mut() {
            if let Some(pose) = self.world.pose(*id) {
                slot.body.set_pose(pose);
                if let Some(report) = reports.get_mut(id) {
                    report.position = pose.position;
                }
            }
            slot.body.tick_policy(&ctx);
        }

        self.ctx = ctx.next();
        let report = TickReport {
            tick: ctx.tick,
            bodies: reports.into_values().collect(),
        };
        tracing::debug!(
            tick = report.tick,
            realized = report.total_realized(),
            rejected = report.total_rejected(),
            "tick complete"
        );
        Ok(report)
    }

    fn decide_all(
        &mut self,
        ctx: &TickContext,
        perceptions: &[Perception<E::Perceivable>],
        reports: &mut BTreeMap<BodyId, BodyTickReport>,
    ) -> Result<(), SimulationError> {
        for ((id, slot), perception) in self.slots.iter_mut().zip(perceptions) {
            let mut controls = TracedControls {
                body: &mut slot.body,
                submissions: Vec::new(),
            };
            let decided = slot.agent.decide(ctx, perception, &mut controls);

            let report = reports.get_mut(id).ok_or(SimulationError::UnknownBody(*id))?;
            for submission in &controls.submissions {
                match submission {
                    Submission::Accepted => report.accepted += 1,
                    Submission::Duplicate => report.duplicates += 1,
                    Submission::Rejected(_) => report.rejected += 1,
                }
                self.trace
                    .emit(TraceEvent::submission(ctx.tick, *id, submission));
            }
            decided?;
        }
        Ok(())
    }

    fn realize_all(
        &mut self,
        ctx: &TickContext,
        reports: &mut BTreeMap<BodyId, BodyTickReport>,
    ) -> Result<(), SimulationError> {
        for (id, slot) in self.slots.iter_mut() {
            let realization = slot.body.realize(&mut self.world)?;
            if realization.realized > 0 {
                self.trace.emit(
                    TraceEvent::new(ctx.tick, *id, TraceKind::InfluenceRealized)
                        .with_count(realization.realized as u64),
                );
            }
            if realization.discarded > 0 {
                self.trace.emit(
                    TraceEvent::new(ctx.tick, *id, TraceKind::InfluenceDiscarded)
                        .with_count(realization.discarded as u64),
                );
            }
            if let Some(report) = reports.get_mut(id) {
                report.realized = realization.realized;
                report.discarded = realization.discarded;
            }
        }
        Ok(())
    }

    fn discard_all_pending(&mut self, ctx: &TickContext) {
        for (id, slot) in self.slots.iter_mut() {
            let dropped = slot.body.discard_pending();
            if dropped > 0 {
                self.trace.emit(
                    TraceEvent::new(ctx.tick, *id, TraceKind::InfluenceDiscarded)
                        .with_count(dropped as u64),
                );
            }
        }
        tracing::warn!(tick = ctx.tick, "tick aborted, pending influences discarded");
    }

    pub fn run(&mut self, ticks: u64) -> Result<RunSummary, SimulationError> {
        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            summary.record(self.step()?);
        }
        summary.alive = self.alive_count();
        tracing::info!(
            ticks = summary.ticks,
            realized = summary.realized,
            rejected = summary.rejected,
            alive = summary.alive,
            "run complete"
        );
        Ok(summary)
    }
}

impl<E, T> Simulation<E, BodyVariant, T>
where
    E: TickedEnvironment,
    T: TraceSink,
{
    /// Returns `Ok(false)` when the body's policy cannot be paralyzed.
    pub fn paralyze(&mut self, id: BodyId, ticks: u32) -> Result<bool, SimulationError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(SimulationError::UnknownBody(id))?;
        Ok(slot.body.policy_mut().paralyze(ticks))
    }
}

/// Hands a body to an agent and records every submission outcome for the trace.
struct TracedControls<'a, P: Perceivable, S: BodyPolicy<P>> {
    body: &'a mut Body<P, S>,
    submissions: Vec<Submission>,
}

impl<P, S> TracedControls<'_, P, S>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    fn record(
        &mut self,
        result: Result<Submission, InfluenceError>,
    ) -> Result<Submission, InfluenceError> {
        if let Ok(submission) = &result {
            self.submissions.push(submission.clone());
        }
        result
    }
}

impl<P, S> Controllable for TracedControls<'_, P, S>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    type Perceivable = P;

    fn body_id(&self) -> BodyId {
        self.body.id()
    }

    fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    fn pose(&self) -> Pose {
        self.body.pose()
    }

    fn influence_speed(&mut self, speed: Vec2) -> Result<Submission, InfluenceError> {
        let result = self.body.influence_speed(speed);
        self.record(result)
    }

    fn influence_acceleration(
        &mut self,
        acceleration: Vec2,
    ) -> Result<Submission, InfluenceError> {
        let result = self.body.influence_acceleration(acceleration);
        self.record(result)
    }

    fn influence_action(&mut self, token: ActionToken) -> Result<Submission, InfluenceError> {
        let result = self.body.influence_action(token);
        self.record(result)
    }

    fn move_in(&mut self, direction: Vec2) -> Result<Submission, InfluenceError> {
        let result = self.body.move_in(direction);
        self.record(result)
    }
}
