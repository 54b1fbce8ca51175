//! The body: sole channel between an agent and the shared world.
//!
//! Perception: `perceive` asks the environment for everything inside the frustum, drops dead
//! bodies when configured to, then lets the policy hide what the body cannot see.
//!
//! Action: agents submit influences; each one is checked against liveness and the policy at
//! submission time, kept in a per-tick pending set, and handed to the environment once per tick
//! by `realize`. Nothing is carried over to the next tick.

use core::fmt::Debug;
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    ActionToken, BodyPolicy, EnvironmentError, EnvironmentMut, EnvironmentView, Frustum,
    FrustumShape, Influence, InfluenceError, InfluenceKind, Perceivable, PerceivableKind,
    Perception, PendingInfluences, Pose, RejectionReason, ShapeError, StandardPolicy, TickContext,
    Vec2, VisibilityMask,
};

/// Stable key the environment uses for "perception of whom".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    pub fn stable_id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Liveness {
    #[default]
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BodyConfig {
    /// Drop `PerceivableKind::Body { alive: false }` entries before the policy runs.
    pub hide_dead_bodies: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            hide_dead_bodies: true,
        }
    }
}

/// Read-only view of a body handed to policy hooks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub id: BodyId,
    pub liveness: Liveness,
    pub pose: Pose,
}

impl BodyState {
    pub fn is_alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }
}

/// Result of a submission entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// An equal influence is already pending for this tick.
    Duplicate,
    Rejected(RejectionReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Submission::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Submission::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

/// What happened to the pending set at the tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Realization {
    /// Influences handed to the environment.
    pub realized: usize,
    /// Influences dropped because the body was dead.
    pub discarded: usize,
}

pub struct Body<P, S = StandardPolicy>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    id: BodyId,
    liveness: Liveness,
    pose: Pose,
    frustum: Frustum,
    pending: PendingInfluences,
    config: BodyConfig,
    policy: S,
    _perceivable: PhantomData<fn() -> P>,
}

impl<P, S> Debug for Body<P, S>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Body")
            .field("id", &self.id)
            .field("liveness", &self.liveness)
            .field("pose", &self.pose)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<P, S> Body<P, S>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    /// A new body is alive, has an empty pending set and a frustum placed at `pose`.
    pub fn new(id: BodyId, pose: Pose, shape: FrustumShape, policy: S) -> Result<Self, ShapeError> {
        Ok(Self {
            id,
            liveness: Liveness::Alive,
            pose,
            frustum: Frustum::new(shape, pose)?,
            pending: PendingInfluences::new(),
            config: BodyConfig::default(),
            policy,
            _perceivable: PhantomData,
        })
    }

    pub fn with_config(mut self, config: BodyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn config(&self) -> BodyConfig {
        self.config
    }

    pub fn policy(&self) -> &S {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut S {
        &mut self.policy
    }

    pub fn state(&self) -> BodyState {
        BodyState {
            id: self.id,
            liveness: self.liveness,
            pose: self.pose,
        }
    }

    /// Only pose mutator. Refreshes the frustum in the same call.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.frustum.update(pose);
    }

    // --- perception -----------------------------------------------------------------------

    /// Filtered perception for this tick. Dead bodies perceive nothing and never query `env`.
    pub fn perceive<E>(&self, env: &E) -> Result<Perception<P>, EnvironmentError>
    where
        E: EnvironmentView<Perceivable = P>,
    {
        if !self.is_alive() {
            return Ok(Perception::empty());
        }

        let raw = env.perceptions(self.id, &self.frustum)?;
        let perception = self.filter_perception(raw);
        if !perception.coverage.is_complete() {
            tracing::debug!(
                body = self.id.0,
                kept = perception.entries.len(),
                "perception filter only partially applied"
            );
        }
        Ok(perception)
    }

    /// Apply the dead-body rule and the policy to a raw list. Output is a subsequence of `raw`.
    pub fn filter_perception(&self, raw: Vec<P>) -> Perception<P> {
        let mut mask = VisibilityMask::all_visible(raw.len());
        if self.config.hide_dead_bodies {
            for (i, entry) in raw.iter().enumerate() {
                if matches!(entry.kind(), PerceivableKind::Body { alive: false }) {
                    mask.hide(i);
                }
            }
        }

        let coverage = self
            .policy
            .filter_perception(&self.state(), &self.frustum, &raw, &mut mask);
        let raw_len = raw.len();
        let entries = mask.apply(raw);
        tracing::trace!(
            body = self.id.0,
            raw = raw_len,
            visible = entries.len(),
            "perception filtered"
        );
        Perception { entries, coverage }
    }

    // --- influences -----------------------------------------------------------------------

    /// Raw set insertion, no policy check. `false` if an equal influence is already pending.
    pub fn add_influence(&mut self, influence: Influence) -> bool {
        self.pending.insert(influence)
    }

    /// Raw set removal. `false` if no equal influence was pending.
    pub fn remove_influence(&mut self, influence: &Influence) -> bool {
        self.pending.remove(influence)
    }

    pub fn pending(&self) -> &PendingInfluences {
        &self.pending
    }

    pub fn influence_speed(&mut self, speed: Vec2) -> Result<Submission, InfluenceError> {
        let influence = Influence::speed(speed)?;
        Ok(self.submit(influence))
    }

    pub fn influence_acceleration(
        &mut self,
        acceleration: Vec2,
    ) -> Result<Submission, InfluenceError> {
        let influence = Influence::acceleration(acceleration)?;
        Ok(self.submit(influence))
    }

    pub fn influence_action(
        &mut self,
        token: impl Into<ActionToken>,
    ) -> Result<Submission, InfluenceError> {
        let influence = Influence::action(token)?;
        Ok(self.submit(influence))
    }

    /// Direct movement request. Gated by the policy's action filter, then queued as the
    /// equivalent speed influence so it is realized with everything else at the tick boundary.
    ///
    /// The result is a velocity request, not a one-step displacement: an environment that keeps
    /// velocity between ticks (the sandbox does) keeps moving the body at `direction` units per
    /// second until another speed or acceleration influence changes it.
    pub fn move_in(&mut self, direction: Vec2) -> Result<Submission, InfluenceError> {
        let influence = Influence::speed(direction)?;
        let verdict = if self.is_alive() {
            self.policy.filter_action(&self.state(), direction)
        } else {
            Some(RejectionReason::Dead)
        };
        Ok(self.admit(influence, verdict))
    }

    /// Policy-checked insertion shared by the `influence_*` entry points.
    pub fn submit(&mut self, influence: Influence) -> Submission {
        let verdict = if self.is_alive() {
            self.policy.filter_influence(&self.state(), &influence)
        } else {
            Some(RejectionReason::Dead)
        };
        self.admit(influence, verdict)
    }

    fn admit(&mut self, influence: Influence, verdict: Option<RejectionReason>) -> Submission {
        if let Some(reason) = verdict {
            tracing::debug!(
                body = self.id.0,
                kind = ?influence.kind(),
                reason = ?reason,
                "influence rejected"
            );
            return Submission::Rejected(reason);
        }
        if self.pending.insert(influence) {
            Submission::Accepted
        } else {
            Submission::Duplicate
        }
    }

    /// Hand the pending set to the environment and clear it.
    ///
    /// A dead body's pending influences are discarded, never applied. The environment is called
    /// only when there is something to realize.
    pub fn realize<E>(&mut self, env: &mut E) -> Result<Realization, EnvironmentError>
    where
        E: EnvironmentMut<Perceivable = P>,
    {
        let influences = self.pending.take();
        if influences.is_empty() {
            return Ok(Realization::default());
        }
        if !self.is_alive() {
            tracing::debug!(
                body = self.id.0,
                discarded = influences.len(),
                "dead body, pending influences discarded"
            );
            return Ok(Realization {
                realized: 0,
                discarded: influences.len(),
            });
        }

        env.realize_influences(self.id, &influences)?;
        Ok(Realization {
            realized: influences.len(),
            discarded: 0,
        })
    }

    /// Drop the pending set without realizing it. Returns how many influences were dropped.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Forward the tick boundary to the policy (countdowns and similar per-tick state).
    pub fn tick_policy(&mut self, ctx: &TickContext) {
        self.policy.on_tick(ctx);
    }

    // --- liveness -------------------------------------------------------------------------

    /// Mark the body dead. Idempotent; returns whether the state changed.
    ///
    /// Pending influences are dropped immediately, they are never deferred until revival.
    pub fn kill(&mut self) -> bool {
        let dropped = self.pending.len();
        self.pending.clear();
        if self.liveness == Liveness::Dead {
            return false;
        }
        self.liveness = Liveness::Dead;
        tracing::debug!(body = self.id.0, dropped, "body killed");
        true
    }

    /// Mark the body alive. Idempotent; returns whether the state changed.
    pub fn revive(&mut self) -> bool {
        if self.liveness == Liveness::Alive {
            return false;
        }
        self.liveness = Liveness::Alive;
        tracing::debug!(body = self.id.0, "body revived");
        true
    }

    pub fn count_pending(&self, kind: InfluenceKind) -> usize {
        self.pending.count_kind(kind)
    }
}

/// Agent-facing surface of a body.
///
/// Agents decide through this trait only: they can read identity, liveness and pose, and submit
/// influences. Perception is handed to the agent by the scheduler, which runs the perceive phase
/// for every body before any agent decides. Raw set access and realization stay with the
/// scheduler.
pub trait Controllable {
    type Perceivable: Perceivable;

    fn body_id(&self) -> BodyId;
    fn is_alive(&self) -> bool;
    fn pose(&self) -> Pose;
    fn influence_speed(&mut self, speed: Vec2) -> Result<Submission, InfluenceError>;
    fn influence_acceleration(&mut self, acceleration: Vec2)
        -> Result<Submission, InfluenceError>;
    fn influence_action(&mut self, token: ActionToken) -> Result<Submission, InfluenceError>;
    fn move_in(&mut self, direction: Vec2) -> Result<Submission, InfluenceError>;
}

impl<P, S> Controllable for Body<P, S>
where
    P: Perceivable,
    S: BodyPolicy<P>,
{
    type Perceivable = P;

    fn body_id(&self) -> BodyId {
        self.id
    }

    fn is_alive(&self) -> bool {
        Body::is_alive(self)
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn influence_speed(&mut self, speed: Vec2) -> Result<Submission, InfluenceError> {
        Body::influence_speed(self, speed)
    }

    fn influence_acceleration(
        &mut self,
        acceleration: Vec2,
    ) -> Result<Submission, InfluenceError> {
        Body::influence_acceleration(self, acceleration)
    }

    fn influence_action(&mut self, token: ActionToken) -> Result<Submission, InfluenceError> {
        Body::influence_action(self, token)
    }

    fn move_in(&mut self, direction: Vec2) -> Result<Submission, InfluenceError> {
        Body::move_in(self, direction)
    }
}
