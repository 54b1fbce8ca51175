use std::cell::Cell;

use embody_core::{
    Aabb, Body, BodyConfig, BodyId, EnvironmentError, EnvironmentView, FilterCoverage, Frustum,
    FrustumShape, OccludedPolicy, Perceivable, PerceivableKind, Pose, StandardPolicy, Vec2,
};

#[derive(Debug, Clone, PartialEq)]
struct Thing {
    name: &'static str,
    position: Vec2,
    kind: PerceivableKind,
}

impl Thing {
    fn body(name: &'static str, x: f32, y: f32) -> Self {
        Self {
            name,
            position: Vec2::new(x, y),
            kind: PerceivableKind::Body { alive: true },
        }
    }

    fn corpse(name: &'static str, x: f32, y: f32) -> Self {
        Self {
            name,
            position: Vec2::new(x, y),
            kind: PerceivableKind::Body { alive: false },
        }
    }

    fn object(name: &'static str, x: f32, y: f32) -> Self {
        Self {
            name,
            position: Vec2::new(x, y),
            kind: PerceivableKind::Object,
        }
    }

    fn wall(name: &'static str, min: Vec2, max: Vec2) -> Self {
        let bounds = Aabb::new(min, max);
        Self {
            name,
            position: bounds.center(),
            kind: PerceivableKind::Obstacle { bounds },
        }
    }
}

impl Perceivable for Thing {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn kind(&self) -> PerceivableKind {
        self.kind
    }
}

#[derive(Default)]
struct TestEnv {
    registered: Vec<BodyId>,
    things: Vec<Thing>,
    queries: Cell<usize>,
    last_origin: Cell<Option<Vec2>>,
}

impl TestEnv {
    fn with(registered: BodyId, things: Vec<Thing>) -> Self {
        Self {
            registered: vec![registered],
            things,
            ..Default::default()
        }
    }
}

impl EnvironmentView for TestEnv {
    type Perceivable = Thing;

    fn perceptions(&self, body: BodyId, frustum: &Frustum) -> Result<Vec<Thing>, EnvironmentError> {
        if !self.registered.contains(&body) {
            return Err(EnvironmentError::UnknownBody(body));
        }
        self.queries.set(self.queries.get() + 1);
        self.last_origin.set(Some(frustum.origin()));
        Ok(self
            .things
            .iter()
            .filter(|t| frustum.contains(t.position))
            .cloned()
            .collect())
    }
}

fn names(entries: &[Thing]) -> Vec<&'static str> {
    entries.iter().map(|t| t.name).collect()
}

const ID: BodyId = BodyId(1);

#[test]
fn wall_hides_one_of_three_entities_and_keeps_order() {
    let wall = Aabb::new(Vec2::new(4.5, -1.0), Vec2::new(5.5, 1.0));
    let body: Body<Thing, OccludedPolicy> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        OccludedPolicy::with_occluders([wall]),
    )
    .unwrap();

    let env = TestEnv::with(
        ID,
        vec![
            Thing::body("a", 2.0, 3.0),
            Thing::body("b", 8.0, 0.0),
            Thing::object("c", -4.0, 0.0),
        ],
    );

    let perception = body.perceive(&env).unwrap();
    assert_eq!(names(&perception.entries), vec!["a", "c"]);
    assert_eq!(perception.coverage, FilterCoverage::Complete);
}

#[test]
fn obstacles_in_the_list_occlude_but_stay_visible() {
    let body: Body<Thing, OccludedPolicy> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        OccludedPolicy::new(),
    )
    .unwrap();

    let env = TestEnv::with(
        ID,
        vec![
            Thing::object("near", 1.0, 0.0),
            Thing::wall("wall", Vec2::new(3.0, -2.0), Vec2::new(3.5, 2.0)),
            Thing::object("behind", 6.0, 0.0),
            Thing::object("above", 6.0, 5.0),
        ],
    );

    let perception = body.perceive(&env).unwrap();
    assert_eq!(names(&perception.entries), vec!["near", "wall", "above"]);
}

#[test]
fn dead_body_perceives_nothing_without_querying() {
    let mut body: Body<Thing> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        StandardPolicy,
    )
    .unwrap();
    let env = TestEnv::with(ID, vec![Thing::body("a", 1.0, 1.0)]);

    body.kill();
    let perception = body.perceive(&env).unwrap();
    assert!(perception.is_empty());
    assert_eq!(env.queries.get(), 0);

    body.revive();
    assert_eq!(body.perceive(&env).unwrap().len(), 1);
    assert_eq!(env.queries.get(), 1);
}

#[test]
fn dead_bodies_are_hidden_unless_configured_otherwise() {
    let env = TestEnv::with(
        ID,
        vec![Thing::corpse("corpse", 1.0, 0.0), Thing::body("alive", 2.0, 0.0)],
    );

    let body: Body<Thing> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        StandardPolicy,
    )
    .unwrap();
    assert_eq!(names(&body.perceive(&env).unwrap().entries), vec!["alive"]);

    let body = body.with_config(BodyConfig {
        hide_dead_bodies: false,
    });
    assert_eq!(
        names(&body.perceive(&env).unwrap().entries),
        vec!["corpse", "alive"]
    );
}

#[test]
fn unrecognized_entries_are_kept_and_coverage_is_partial() {
    let body: Body<Thing, OccludedPolicy> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        OccludedPolicy::new(),
    )
    .unwrap();

    let env = TestEnv::with(
        ID,
        vec![
            Thing::object("known", 1.0, 0.0),
            Thing {
                name: "mystery",
                position: Vec2::new(2.0, 0.0),
                kind: PerceivableKind::Unrecognized,
            },
        ],
    );

    let perception = body.perceive(&env).unwrap();
    assert_eq!(names(&perception.entries), vec!["known", "mystery"]);
    assert_eq!(perception.coverage, FilterCoverage::Partial);
}

#[test]
fn clear_sight_range_limits_what_is_seen() {
    let body: Body<Thing, OccludedPolicy> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        OccludedPolicy::new().clear_sight_range(3.0),
    )
    .unwrap();

    let env = TestEnv::with(
        ID,
        vec![Thing::object("close", 2.0, 0.0), Thing::object("far", 7.0, 0.0)],
    );

    assert_eq!(names(&body.perceive(&env).unwrap().entries), vec!["close"]);
}

#[test]
fn query_uses_the_current_pose() {
    let mut body: Body<Thing> = Body::new(
        ID,
        Pose::at(Vec2::ZERO),
        FrustumShape::Cone {
            range: 5.0,
            half_aperture: 0.5,
        },
        StandardPolicy,
    )
    .unwrap();
    let env = TestEnv::with(ID, vec![Thing::object("east", 20.0, 0.0)]);

    assert!(body.perceive(&env).unwrap().is_empty());

    body.set_pose(Pose::new(Vec2::new(17.0, 0.0), 0.0));
    assert_eq!(body.frustum().origin(), Vec2::new(17.0, 0.0));
    assert_eq!(names(&body.perceive(&env).unwrap().entries), vec!["east"]);
    assert_eq!(env.last_origin.get(), Some(Vec2::new(17.0, 0.0)));

    // Turning around puts the object behind the cone.
    body.set_pose(Pose::new(Vec2::new(17.0, 0.0), std::f32::consts::PI));
    assert!(body.perceive(&env).unwrap().is_empty());
}

#[test]
fn unregistered_body_fails_fast() {
    let body: Body<Thing> = Body::new(
        BodyId(99),
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 1.0 },
        StandardPolicy,
    )
    .unwrap();
    let env = TestEnv::with(ID, Vec::new());

    assert_eq!(
        body.perceive(&env).unwrap_err(),
        EnvironmentError::UnknownBody(BodyId(99))
    );
}
