//! Closed set of policies a scenario can assign to a body.

use embody_core::{
    BodyPolicy, BodyState, FilterCoverage, Frustum, Influence, OccludedPolicy, ParalyzablePolicy,
    Perceivable, RejectionReason, StandardPolicy, TickContext, Vec2, VisibilityMask,
};

/// Policy chosen per body at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyVariant {
    Standard(StandardPolicy),
    Occluded(OccludedPolicy),
    Paralyzable(ParalyzablePolicy<OccludedPolicy>),
}

impl Default for BodyVariant {
    fn default() -> Self {
        BodyVariant::Standard(StandardPolicy)
    }
}

impl BodyVariant {
    pub fn name(&self) -> &'static str {
        match self {
            BodyVariant::Standard(_) => "standard",
            BodyVariant::Occluded(_) => "occluded",
            BodyVariant::Paralyzable(_) => "paralyzable",
        }
    }

    /// Returns `false` when the variant cannot be paralyzed.
    pub fn paralyze(&mut self, ticks: u32) -> bool {
        match self {
            BodyVariant::Paralyzable(policy) => {
                policy.paralyze(ticks);
                true
            }
            _ => false,
        }
    }

    pub fn is_paralyzed(&self) -> bool {
        matches!(self, BodyVariant::Paralyzable(policy) if policy.is_paralyzed())
    }

    fn as_policy<P: Perceivable>(&self) -> &dyn BodyPolicy<P> {
        match self {
            BodyVariant::Standard(p) => p,
            BodyVariant::Occluded(p) => p,
            BodyVariant::Paralyzable(p) => p,
        }
    }
}

impl From<StandardPolicy> for BodyVariant {
    fn from(policy: StandardPolicy) -> Self {
        BodyVariant::Standard(policy)
    }
}

impl From<OccludedPolicy> for BodyVariant {
    fn from(policy: OccludedPolicy) -> Self {
        BodyVariant::Occluded(policy)
    }
}

impl From<ParalyzablePolicy<OccludedPolicy>> for BodyVariant {
    fn from(policy: ParalyzablePolicy<OccludedPolicy>) -> Self {
        BodyVariant::Paralyzable(policy)
    }
}

impl<P: Perceivable> BodyPolicy<P> for BodyVariant {
    fn filter_perception(
        &self,
        state: &BodyState,
        frustum: &Frustum,
        raw: &[P],
        mask: &mut VisibilityMask,
    ) -> FilterCoverage {
        self.as_policy().filter_perception(state, frustum, raw, mask)
    }

    fn filter_influence(&self, state: &BodyState, influence: &Influence) -> Option<RejectionReason> {
        self.as_policy::<P>().filter_influence(state, influence)
    }

    fn filter_action(&self, state: &BodyState, direction: Vec2) -> Option<RejectionReason> {
        self.as_policy::<P>().filter_action(state, direction)
    }

    fn on_tick(&mut self, ctx: &TickContext) {
        match self {
            BodyVariant::Standard(p) => BodyPolicy::<P>::on_tick(p, ctx),
            BodyVariant::Occluded(p) => BodyPolicy::<P>::on_tick(p, ctx),
            BodyVariant::Paralyzable(p) => BodyPolicy::<P>::on_tick(p, ctx),
        }
    }
}
