//! Per-body arbitration strategies.
//!
//! A body does not subclass anything: it is built with a policy value that answers three
//! questions each tick (what can I see, may this influence pass, may I move). Liveness is checked
//! by the body itself before a policy is consulted, so no policy can let a dead body act.

use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::BodyState;
use crate::frustum::Frustum;
use crate::influence::{ActionToken, Influence};
use crate::math::{Aabb, Vec2};
use crate::perceivable::{FilterCoverage, Perceivable, PerceivableKind, VisibilityMask};
use crate::tick::TickContext;

/// Why an influence was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RejectionReason {
    Dead,
    Paralyzed,
    Constrained(Cow<'static, str>),
}

pub trait BodyPolicy<P: Perceivable> {
    /// Hide entries of `raw` the body cannot actually perceive.
    fn filter_perception(
        &self,
        _state: &BodyState,
        _frustum: &Frustum,
        _raw: &[P],
        _mask: &mut VisibilityMask,
    ) -> FilterCoverage {
        FilterCoverage::Complete
    }

    /// `Some(reason)` rejects the influence.
    fn filter_influence(&self, _state: &BodyState, _influence: &Influence) -> Option<RejectionReason> {
        None
    }

    /// Gate for the direct movement path. Defaults to the verdict for the equivalent speed influence.
    fn filter_action(&self, state: &BodyState, direction: Vec2) -> Option<RejectionReason> {
        let speed = Influence::speed(direction).ok()?;
        self.filter_influence(state, &speed)
    }

    /// Called once per tick after realization.
    fn on_tick(&mut self, _ctx: &TickContext) {}
}

impl<P: Perceivable> BodyPolicy<P> for Box<dyn BodyPolicy<P>> {
    fn filter_perception(
        &self,
        state: &BodyState,
        frustum: &Frustum,
        raw: &[P],
        mask: &mut VisibilityMask,
    ) -> FilterCoverage {
        (**self).filter_perception(state, frustum, raw, mask)
    }

    fn filter_influence(&self, state: &BodyState, influence: &Influence) -> Option<RejectionReason> {
        (**self).filter_influence(state, influence)
    }

    fn filter_action(&self, state: &BodyState, direction: Vec2) -> Option<RejectionReason> {
        (**self).filter_action(state, direction)
    }

    fn on_tick(&mut self, ctx: &TickContext) {
        (**self).on_tick(ctx)
    }
}

/// Sees everything the environment reports and admits every influence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardPolicy;

impl<P: Perceivable> BodyPolicy<P> for StandardPolicy {}

/// Line-of-sight filtering against obstacles.
///
/// Occluders are the static `occluders` given to the policy (level geometry the body knows about)
/// plus every obstacle entry of the perception list. An entry is hidden when the segment from the
/// frustum origin to its position crosses an occluder. Obstacle entries themselves stay visible.
/// With `clear_sight_range` set, non-obstacle entries further than that range are hidden as well
/// (poor sight at distance).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OccludedPolicy {
    pub occluders: Vec<Aabb>,
    pub clear_sight_range: Option<f32>,
}

impl OccludedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occluders(occluders: impl IntoIterator<Item = Aabb>) -> Self {
        Self {
            occluders: occluders.into_iter().collect(),
            clear_sight_range: None,
        }
    }

    pub fn clear_sight_range(mut self, range: f32) -> Self {
        self.clear_sight_range = Some(range.max(0.0));
        self
    }

    pub fn add_occluder(&mut self, bounds: Aabb) {
        self.occluders.push(bounds);
    }
}

impl<P: Perceivable> BodyPolicy<P> for OccludedPolicy {
    fn filter_perception(
        &self,
        _state: &BodyState,
        frustum: &Frustum,
        raw: &[P],
        mask: &mut VisibilityMask,
    ) -> FilterCoverage {
        let eye = frustum.origin();
        // `None` marks static geometry, `Some(i)` an obstacle at index `i` of `raw`.
        let blockers: Vec<(Option<usize>, Aabb)> = self
            .occluders
            .iter()
            .map(|bounds| (None, *bounds))
            .chain(raw.iter().enumerate().filter_map(|(i, p)| match p.kind() {
                PerceivableKind::Obstacle { bounds } => Some((Some(i), bounds)),
                _ => None,
            }))
            // A body standing inside an obstacle's bounds is not blinded by it.
            .filter(|(_, bounds)| !bounds.contains(eye))
            .collect();

        let mut coverage = FilterCoverage::Complete;
        for (i, entry) in raw.iter().enumerate() {
            match entry.kind() {
                PerceivableKind::Obstacle { .. } => continue,
                PerceivableKind::Unrecognized => {
                    coverage = FilterCoverage::Partial;
                    continue;
                }
                PerceivableKind::Body { .. } | PerceivableKind::Object => {}
            }

            let target = entry.position();
            if let Some(range) = self.clear_sight_range {
                if target.distance(eye) > range {
                    mask.hide(i);
                    continue;
                }
            }

            let blocked = blockers
                .iter()
                .any(|(owner, bounds)| *owner != Some(i) && bounds.segment_intersects(eye, target));
            if blocked {
                mask.hide(i);
            }
        }
        coverage
    }
}

/// Wraps another policy and rejects influences while the body is paralyzed.
///
/// Paralysis is counted in ticks and decremented by [`BodyPolicy::on_tick`]. Motion influences are
/// always rejected while paralyzed; action tokens listed in `allowed_while_paralyzed` still pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParalyzablePolicy<I = StandardPolicy> {
    inner: I,
    paralyzed_ticks: u32,
    allowed_while_paralyzed: Vec<ActionToken>,
}

impl ParalyzablePolicy<StandardPolicy> {
    pub fn new() -> Self {
        Self::wrap(StandardPolicy)
    }
}

impl<I> ParalyzablePolicy<I> {
    pub fn wrap(inner: I) -> Self {
        Self {
            inner,
            paralyzed_ticks: 0,
            allowed_while_paralyzed: Vec::new(),
        }
    }

    pub fn allow_while_paralyzed(mut self, token: impl Into<ActionToken>) -> Self {
        self.allowed_while_paralyzed.push(token.into());
        self
    }

    /// Paralyze for at least `ticks` ticks. Never shortens an ongoing paralysis.
    pub fn paralyze(&mut self, ticks: u32) {
        self.paralyzed_ticks = self.paralyzed_ticks.max(ticks);
    }

    pub fn cure(&mut self) {
        self.paralyzed_ticks = 0;
    }

    pub fn is_paralyzed(&self) -> bool {
        self.paralyzed_ticks > 0
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.paralyzed_ticks
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<P, I> BodyPolicy<P> for ParalyzablePolicy<I>
where
    P: Perceivable,
    I: BodyPolicy<P>,
{
    fn filter_perception(
        &self,
        state: &BodyState,
        frustum: &Frustum,
        raw: &[P],
        mask: &mut VisibilityMask,
    ) -> FilterCoverage {
        self.inner.filter_perception(state, frustum, raw, mask)
    }

    fn filter_influence(&self, state: &BodyState, influence: &Influence) -> Option<RejectionReason> {
        if self.is_paralyzed() {
            let allowed = influence
                .action_token()
                .is_some_and(|token| self.allowed_while_paralyzed.contains(token));
            if !allowed {
                return Some(RejectionReason::Paralyzed);
            }
        }
        self.inner.filter_influence(state, influence)
    }

    fn on_tick(&mut self, ctx: &TickContext) {
        self.paralyzed_ticks = self.paralyzed_ticks.saturating_sub(1);
        self.inner.on_tick(ctx);
    }
}
