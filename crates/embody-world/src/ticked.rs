use embody_core::{BodyId, EnvironmentError, EnvironmentMut, Pose, TickContext};

/// Environment hooks the scheduler needs around the body phases of a tick.
///
/// `begin_tick` runs before any body perceives; `commit` runs after every body realized and is
/// where the world integrates motion. Bodies pick up their new pose through [`Self::pose`].
pub trait TickedEnvironment: EnvironmentMut {
    fn begin_tick(&mut self, ctx: &TickContext);

    fn commit(&mut self, ctx: &TickContext) -> Result<(), EnvironmentError>;

    fn pose(&self, body: BodyId) -> Option<Pose>;

    /// Mirror a body's liveness into the world so other bodies perceive it correctly.
    fn set_alive(&mut self, body: BodyId, alive: bool) -> Result<(), EnvironmentError>;
}
