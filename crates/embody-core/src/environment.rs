use crate::{BodyId, EnvironmentError, Frustum, Influence, Perceivable, Vec2};

/// Read side of the shared world, as seen by bodies.
///
/// Implementations own all spatial state. Queries must reflect the current tick and must never
/// include the querying body. Ordering only has to be stable within one call.
pub trait EnvironmentView {
    type Perceivable: Perceivable;

    fn perceptions(
        &self,
        body: BodyId,
        frustum: &Frustum,
    ) -> Result<Vec<Self::Perceivable>, EnvironmentError>;
}

/// The only two entry points through which a body's decisions change the world.
pub trait EnvironmentMut: EnvironmentView {
    /// Authoritative motion. May clamp or refuse; returns the displacement actually applied.
    fn move_body(&mut self, body: BodyId, direction: Vec2) -> Result<Vec2, EnvironmentError>;

    /// Turn admitted influences into world state. Called at most once per body per tick,
    /// after every agent has finished submitting.
    fn realize_influences(
        &mut self,
        body: BodyId,
        influences: &[Influence],
    ) -> Result<(), EnvironmentError>;
}
