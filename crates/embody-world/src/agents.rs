//! Decision makers. Agents see a filtered [`Perception`] and act only through [`Controllable`].

use embody_core::{
    ActionToken, Controllable, DeterministicRng, InfluenceError, Perceivable, PerceivableKind,
    Perception, TickContext, Vec2,
};

pub trait Agent<P: Perceivable> {
    fn decide(
        &mut self,
        ctx: &TickContext,
        perception: &Perception<P>,
        body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError>;
}

impl<P: Perceivable, A: Agent<P> + ?Sized> Agent<P> for Box<A> {
    fn decide(
        &mut self,
        ctx: &TickContext,
        perception: &Perception<P>,
        body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError> {
        (**self).decide(ctx, perception, body)
    }
}

/// Adapts a closure into an [`Agent`].
pub struct FnAgent<F>(pub F);

impl<P, F> Agent<P> for FnAgent<F>
where
    P: Perceivable,
    F: FnMut(
        &TickContext,
        &Perception<P>,
        &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError>,
{
    fn decide(
        &mut self,
        ctx: &TickContext,
        perception: &Perception<P>,
        body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError> {
        (self.0)(ctx, perception, body)
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleAgent;

impl<P: Perceivable> Agent<P> for IdleAgent {
    fn decide(
        &mut self,
        _ctx: &TickContext,
        _perception: &Perception<P>,
        _body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError> {
        Ok(())
    }
}

/// Random walk. Each tick the heading drifts by at most `turn_rate` radians, drawn from the
/// body's deterministic stream for that tick.
#[derive(Debug, Clone, Copy)]
pub struct WanderAgent {
    pub speed: f32,
    pub turn_rate: f32,
    heading: Option<f32>,
}

impl WanderAgent {
    pub fn new(speed: f32, turn_rate: f32) -> Self {
        Self {
            speed,
            turn_rate,
            heading: None,
        }
    }
}

impl<P: Perceivable> Agent<P> for WanderAgent {
    fn decide(
        &mut self,
        ctx: &TickContext,
        _perception: &Perception<P>,
        body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError> {
        let mut rng = ctx.rng_for_body(body.body_id(), 0);
        let heading = self.heading.unwrap_or_else(|| body.pose().heading)
            + rng.next_f32_signed() * self.turn_rate;
        self.heading = Some(heading);
        body.move_in(Vec2::from_angle(heading) * self.speed)?;
        Ok(())
    }
}

/// Steers toward the nearest visible object and performs `action` once within `arrive_radius`.
#[derive(Debug, Clone)]
pub struct SeekAgent {
    pub acceleration: f32,
    pub arrive_radius: f32,
    pub action: ActionToken,
}

impl SeekAgent {
    pub fn new(acceleration: f32, arrive_radius: f32, action: impl Into<ActionToken>) -> Self {
        Self {
            acceleration,
            arrive_radius,
            action: action.into(),
        }
    }
}

impl<P: Perceivable> Agent<P> for SeekAgent {
    fn decide(
        &mut self,
        _ctx: &TickContext,
        perception: &Perception<P>,
        body: &mut dyn Controllable<Perceivable = P>,
    ) -> Result<(), InfluenceError> {
        let here = body.pose().position;
        let Some(target) = perception.nearest(here, |p| p.kind() == PerceivableKind::Object) else {
            return Ok(());
        };

        let offset = target.position() - here;
        if offset.length() <= self.arrive_radius {
            body.influence_speed(Vec2::ZERO)?;
            body.influence_action(self.action.clone())?;
        } else {
            body.influence_acceleration(offset.normalize_or_zero() * self.acceleration)?;
        }
        Ok(())
    }
}
