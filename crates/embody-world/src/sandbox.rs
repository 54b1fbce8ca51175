//! Bounded 2D reference environment.
//!
//! Holds the authoritative state for every registered body (pose, velocity, liveness), static
//! walls and labelled objects. It answers perception queries, applies motion, and turns realized
//! influences into velocity changes and logged actions.

use std::collections::BTreeMap;

use serde::Serialize;

use embody_core::{
    Aabb, ActionToken, BodyId, EnvironmentError, EnvironmentMut, EnvironmentView, Frustum,
    Influence, InfluencePayload, InfluenceKind, PerceivableKind, Pose, TickContext, Vec2,
};

use crate::{Percept, PerceptId, TickedEnvironment};

/// Largest distance covered by one collision sample in [`SandboxWorld::move_body`].
const MOVE_STEP: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
struct BodyEntry {
    pose: Pose,
    velocity: Vec2,
    max_speed: f32,
    alive: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct WorldObject {
    position: Vec2,
    label: String,
}

/// One realized ACTION influence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub tick: u64,
    pub body: BodyId,
    pub token: ActionToken,
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    bounds: Aabb,
    default_max_speed: f32,
    bodies: BTreeMap<BodyId, BodyEntry>,
    walls: BTreeMap<u32, Aabb>,
    objects: BTreeMap<u32, WorldObject>,
    next_static_id: u32,
    actions: Vec<ActionRecord>,
    tick: u64,
    dt_seconds: f32,
}

impl SandboxWorld {
    pub fn new(bounds: Aabb, default_max_speed: f32) -> Self {
        Self {
            bounds,
            default_max_speed: default_max_speed.max(0.0),
            bodies: BTreeMap::new(),
            walls: BTreeMap::new(),
            objects: BTreeMap::new(),
            next_static_id: 0,
            actions: Vec::new(),
            tick: 0,
            dt_seconds: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Register a body. Returns `false` if the id is already taken.
    pub fn spawn_body(&mut self, id: BodyId, pose: Pose) -> bool {
        self.spawn_body_with_speed(id, pose, self.default_max_speed)
    }

    pub fn spawn_body_with_speed(&mut self, id: BodyId, pose: Pose, max_speed: f32) -> bool {
        if self.bodies.contains_key(&id) {
            return false;
        }
        let pose = Pose::new(self.bounds.closest_point(pose.position), pose.heading);
        self.bodies.insert(
            id,
            BodyEntry {
                pose,
                velocity: Vec2::ZERO,
                max_speed: max_speed.max(0.0),
                alive: true,
            },
        );
        true
    }

    /// Permanently remove a body (not the same as killing it).
    pub fn despawn_body(&mut self, id: BodyId) -> bool {
        self.bodies.remove(&id).is_some()
    }

    pub fn add_wall(&mut self, bounds: Aabb) -> u32 {
        let id = self.next_id();
        self.walls.insert(id, bounds);
        id
    }

    pub fn add_object(&mut self, position: Vec2, label: impl Into<String>) -> u32 {
        let id = self.next_id();
        self.objects.insert(
            id,
            WorldObject {
                position,
                label: label.into(),
            },
        );
        id
    }

    pub fn remove_object(&mut self, id: u32) -> bool {
        self.objects.remove(&id).is_some()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_static_id;
        self.next_static_id += 1;
        id
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    pub fn contains_body(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    pub fn is_alive(&self, id: BodyId) -> Option<bool> {
        self.bodies.get(&id).map(|b| b.alive)
    }

    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    pub fn take_actions(&mut self) -> Vec<ActionRecord> {
        std::mem::take(&mut self.actions)
    }

    pub fn is_blocked(&self, point: Vec2) -> bool {
        !self.bounds.contains(point) || self.walls.values().any(|w| w.contains(point))
    }

    fn entry_mut(&mut self, id: BodyId) -> Result<&mut BodyEntry, EnvironmentError> {
        self.bodies
            .get_mut(&id)
            .ok_or(EnvironmentError::UnknownBody(id))
    }
}

impl EnvironmentView for SandboxWorld {
    type Perceivable = Percept;

    fn perceptions(&self, body: BodyId, frustum: &Frustum) -> Result<Vec<Percept>, EnvironmentError> {
        if !self.bodies.contains_key(&body) {
            return Err(EnvironmentError::UnknownBody(body));
        }

        let mut out = Vec::new();
        for (id, entry) in &self.bodies {
            if *id == body || !frustum.contains(entry.pose.position) {
                continue;
            }
            out.push(Percept {
                id: PerceptId::Body(*id),
                position: entry.pose.position,
                kind: PerceivableKind::Body { alive: entry.alive },
                label: None,
            });
        }

        let broad = frustum.bounds();
        for (id, bounds) in &self.walls {
            if !broad.intersects(bounds) || !frustum.touches(bounds) {
                continue;
            }
            out.push(Percept {
                id: PerceptId::Wall(*id),
                position: bounds.center(),
                kind: PerceivableKind::Obstacle { bounds: *bounds },
                label: None,
            });
        }

        for (id, object) in &self.objects {
            if !frustum.contains(object.position) {
                continue;
            }
            out.push(Percept {
                id: PerceptId::Object(*id),
                position: object.position,
                kind: PerceivableKind::Object,
                label: Some(object.label.clone()),
            });
        }

        Ok(out)
    }
}

impl EnvironmentMut for SandboxWorld {
    /// Moves along `direction`, sampling every [`MOVE_STEP`] and stopping at the last free
    /// position before a wall or the world edge. Dead bodies do not move.
    fn move_body(&mut self, body: BodyId, direction: Vec2) -> Result<Vec2, EnvironmentError> {
        let (start, alive) = {
            let entry = self
                .bodies
                .get(&body)
                .ok_or(EnvironmentError::UnknownBody(body))?;
            (entry.pose.position, entry.alive)
        };
        if !alive || !direction.is_finite() {
            return Ok(Vec2::ZERO);
        }

        let distance = direction.length();
        let steps = (distance / MOVE_STEP).ceil().max(1.0) as u32;
        let mut reached = start;
        for i in 1..=steps {
            let candidate = start + direction * (i as f32 / steps as f32);
            if self.is_blocked(candidate) {
                break;
            }
            reached = candidate;
        }

        let applied = reached - start;
        let entry = self.entry_mut(body)?;
        let heading = if applied.length_squared() > f32::EPSILON {
            applied.angle()
        } else {
            entry.pose.heading
        };
        entry.pose = Pose::new(reached, heading);
        if applied != direction {
            // Blocked: whatever velocity pushed into the obstacle is lost.
            entry.velocity = Vec2::ZERO;
        }
        Ok(applied)
    }

    /// Applied in submission order: SPEED replaces the velocity, ACCELERATION adds `a * dt`,
    /// ACTION is logged. The resulting velocity is clamped to the body's max speed.
    fn realize_influences(
        &mut self,
        body: BodyId,
        influences: &[Influence],
    ) -> Result<(), EnvironmentError> {
        let tick = self.tick;
        let dt = self.dt_seconds;
        let entry = self.entry_mut(body)?;
        if !entry.alive {
            return Err(EnvironmentError::Realization {
                body,
                reason: "body is dead in the world".to_string(),
            });
        }

        let mut actions = Vec::new();
        for influence in influences {
            match (influence.kind(), influence.payload()) {
                (InfluenceKind::Speed, InfluencePayload::Vector(v)) => entry.velocity = *v,
                (InfluenceKind::Acceleration, InfluencePayload::Vector(a)) => {
                    entry.velocity += *a * dt;
                }
                (InfluenceKind::Action, InfluencePayload::Action(token)) => {
                    actions.push(ActionRecord {
                        tick,
                        body,
                        token: token.clone(),
                    });
                }
                _ => {}
            }
        }
        entry.velocity = entry.velocity.clamp_length(entry.max_speed);

        for action in &actions {
            tracing::debug!(tick, body = body.0, token = action.token.as_str(), "action realized");
        }
        self.actions.extend(actions);
        Ok(())
    }
}

impl TickedEnvironment for SandboxWorld {
    fn begin_tick(&mut self, ctx: &TickContext) {
        self.tick = ctx.tick;
        self.dt_seconds = ctx.dt_seconds.max(0.0);
    }

    fn commit(&mut self, ctx: &TickContext) -> Result<(), EnvironmentError> {
        let dt = ctx.dt_seconds.max(0.0);
        let moving: Vec<(BodyId, Vec2)> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.alive && b.velocity.length_squared() > 0.0)
            .map(|(id, b)| (*id, b.velocity * dt))
            .collect();
        for (id, displacement) in moving {
            self.move_body(id, displacement)?;
        }
        Ok(())
    }

    fn pose(&self, body: BodyId) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn set_alive(&mut self, body: BodyId, alive: bool) -> Result<(), EnvironmentError> {
        let entry = self.entry_mut(body)?;
        entry.alive = alive;
        if !alive {
            entry.velocity = Vec2::ZERO;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embody_core::FrustumShape;

    fn world() -> SandboxWorld {
        SandboxWorld::new(
            Aabb::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0)),
            5.0,
        )
    }

    #[test]
    fn perception_excludes_self_and_orders_by_id() {
        let mut w = world();
        w.spawn_body(BodyId(2), Pose::at(Vec2::new(1.0, 0.0)));
        w.spawn_body(BodyId(1), Pose::at(Vec2::ZERO));
        w.spawn_body(BodyId(3), Pose::at(Vec2::new(-1.0, 0.0)));
        w.add_object(Vec2::new(0.0, 2.0), "food");

        let frustum = Frustum::new(FrustumShape::Circle { range: 5.0 }, Pose::at(Vec2::ZERO)).unwrap();
        let seen = w.perceptions(BodyId(1), &frustum).unwrap();
        let ids: Vec<_> = seen.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                PerceptId::Body(BodyId(2)),
                PerceptId::Body(BodyId(3)),
                PerceptId::Object(0)
            ]
        );
        assert_eq!(seen[2].label.as_deref(), Some("food"));
    }

    #[test]
    fn movement_stops_before_walls_and_edges() {
        let mut w = world();
        w.spawn_body(BodyId(1), Pose::at(Vec2::ZERO));
        w.add_wall(Aabb::new(Vec2::new(2.0, -1.0), Vec2::new(3.0, 1.0)));

        let applied = w.move_body(BodyId(1), Vec2::new(5.0, 0.0)).unwrap();
        assert!(applied.x < 2.0 && applied.x >= 1.75);
        assert!(!w.is_blocked(w.pose(BodyId(1)).unwrap().position));

        let applied = w.move_body(BodyId(1), Vec2::new(0.0, -50.0)).unwrap();
        assert!(applied.y > -11.0);
        assert!(w.bounds().contains(w.pose(BodyId(1)).unwrap().position));
    }

    #[test]
    fn influences_update_velocity_and_log_actions() {
        let mut w = world();
        w.spawn_body(BodyId(1), Pose::at(Vec2::ZERO));
        w.begin_tick(&TickContext::new(4, 0.5, 0));

        let influences = [
            Influence::speed(Vec2::new(1.0, 0.0)).unwrap(),
            Influence::acceleration(Vec2::new(0.0, 2.0)).unwrap(),
            Influence::action("dig").unwrap(),
        ];
        w.realize_influences(BodyId(1), &influences).unwrap();

        assert_eq!(w.velocity(BodyId(1)), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(w.actions().len(), 1);
        assert_eq!(w.actions()[0].tick, 4);
        assert_eq!(w.actions()[0].token.as_str(), "dig");
    }

    #[test]
    fn unknown_bodies_are_reported() {
        let mut w = world();
        let frustum = Frustum::new(FrustumShape::Circle { range: 1.0 }, Pose::default()).unwrap();
        assert_eq!(
            w.perceptions(BodyId(9), &frustum).unwrap_err(),
            EnvironmentError::UnknownBody(BodyId(9))
        );
        assert!(w.move_body(BodyId(9), Vec2::X).is_err());
    }
}
