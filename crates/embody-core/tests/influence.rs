use embody_core::{
    ActionToken, Body, BodyId, Controllable, EnvironmentError, EnvironmentMut, EnvironmentView,
    Frustum, FrustumShape, Influence, InfluenceError, InfluenceKind, Liveness, ParalyzablePolicy,
    Perceivable, PerceivableKind, Pose, Realization, RejectionReason, StandardPolicy, Submission,
    TickContext, Vec2,
};

#[derive(Debug, Clone, Copy)]
struct Dot(Vec2);

impl Perceivable for Dot {
    fn position(&self) -> Vec2 {
        self.0
    }

    fn kind(&self) -> PerceivableKind {
        PerceivableKind::Object
    }
}

#[derive(Default)]
struct RecordingEnv {
    realized: Vec<(BodyId, Vec<Influence>)>,
}

impl EnvironmentView for RecordingEnv {
    type Perceivable = Dot;

    fn perceptions(&self, _body: BodyId, _frustum: &Frustum) -> Result<Vec<Dot>, EnvironmentError> {
        Ok(Vec::new())
    }
}

impl EnvironmentMut for RecordingEnv {
    fn move_body(&mut self, _body: BodyId, direction: Vec2) -> Result<Vec2, EnvironmentError> {
        Ok(direction)
    }

    fn realize_influences(
        &mut self,
        body: BodyId,
        influences: &[Influence],
    ) -> Result<(), EnvironmentError> {
        self.realized.push((body, influences.to_vec()));
        Ok(())
    }
}

fn standard_body() -> Body<Dot> {
    Body::new(
        BodyId(7),
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        StandardPolicy,
    )
    .unwrap()
}

fn paralyzable_body() -> Body<Dot, ParalyzablePolicy> {
    Body::new(
        BodyId(8),
        Pose::at(Vec2::ZERO),
        FrustumShape::Circle { range: 10.0 },
        ParalyzablePolicy::new().allow_while_paralyzed("shout"),
    )
    .unwrap()
}

#[test]
fn repeated_acceleration_is_stored_once() {
    let mut body = standard_body();

    assert_eq!(
        body.influence_acceleration(Vec2::new(1.0, 0.0)).unwrap(),
        Submission::Accepted
    );
    assert_eq!(
        body.influence_acceleration(Vec2::new(1.0, 0.0)).unwrap(),
        Submission::Duplicate
    );
    assert_eq!(body.pending().len(), 1);
    assert_eq!(body.count_pending(InfluenceKind::Acceleration), 1);
}

#[test]
fn raw_add_and_remove_have_set_semantics() {
    let mut body = standard_body();
    let dig = Influence::action("dig").unwrap();

    assert!(body.add_influence(dig.clone()));
    assert!(!body.add_influence(dig.clone()));
    assert_eq!(body.pending().len(), 1);

    assert!(body.remove_influence(&dig));
    assert!(!body.remove_influence(&dig));
    assert!(body.pending().is_empty());
}

#[test]
fn dead_body_rejects_every_kind() {
    let mut body = standard_body();
    body.kill();

    let dead = Submission::Rejected(RejectionReason::Dead);
    assert_eq!(body.influence_speed(Vec2::X).unwrap(), dead);
    assert_eq!(body.influence_acceleration(Vec2::Y).unwrap(), dead);
    assert_eq!(body.influence_action("dig").unwrap(), dead);
    assert_eq!(body.move_in(Vec2::X).unwrap(), dead);
    assert!(body.pending().is_empty());
}

#[test]
fn malformed_submissions_fail_before_arbitration() {
    let mut body = standard_body();

    let err = body.influence_action("").unwrap_err();
    assert!(matches!(
        err,
        InfluenceError::InvalidInfluence {
            kind: InfluenceKind::Action,
            ..
        }
    ));
    assert!(body.influence_speed(Vec2::new(f32::NAN, 1.0)).is_err());
    assert!(body.pending().is_empty());
}

#[test]
fn liveness_toggles_are_idempotent() {
    let mut body = standard_body();
    assert_eq!(body.liveness(), Liveness::Alive);

    assert!(body.kill());
    assert!(!body.kill());
    assert_eq!(body.liveness(), Liveness::Dead);

    assert!(body.revive());
    assert!(!body.revive());
    assert_eq!(body.liveness(), Liveness::Alive);
}

#[test]
fn kill_before_realization_discards_pending() {
    let mut body = standard_body();
    let mut env = RecordingEnv::default();

    assert!(body.influence_speed(Vec2::X).unwrap().is_accepted());
    body.kill();

    let realization = body.realize(&mut env).unwrap();
    assert_eq!(realization.realized, 0);
    assert!(env.realized.is_empty());
    assert!(body.pending().is_empty());

    // Reviving does not bring the discarded influence back.
    body.revive();
    assert_eq!(body.realize(&mut env).unwrap(), Realization::default());
    assert!(env.realized.is_empty());
}

#[test]
fn raw_influences_on_a_dead_body_are_discarded_at_realization() {
    let mut body = standard_body();
    let mut env = RecordingEnv::default();

    body.kill();
    assert!(body.add_influence(Influence::speed(Vec2::X).unwrap()));

    let realization = body.realize(&mut env).unwrap();
    assert_eq!(
        realization,
        Realization {
            realized: 0,
            discarded: 1
        }
    );
    assert!(env.realized.is_empty());
}

#[test]
fn realization_hands_everything_over_once_and_clears() {
    let mut body = standard_body();
    let mut env = RecordingEnv::default();

    body.influence_speed(Vec2::new(2.0, 0.0)).unwrap();
    body.influence_acceleration(Vec2::new(0.0, 1.0)).unwrap();
    body.influence_action("dig").unwrap();

    let realization = body.realize(&mut env).unwrap();
    assert_eq!(realization.realized, 3);
    assert_eq!(env.realized.len(), 1);

    let (id, influences) = &env.realized[0];
    assert_eq!(*id, BodyId(7));
    let kinds: Vec<_> = influences.iter().map(Influence::kind).collect();
    assert_eq!(
        kinds,
        vec![
            InfluenceKind::Speed,
            InfluenceKind::Acceleration,
            InfluenceKind::Action
        ]
    );

    assert!(body.pending().is_empty());
    body.realize(&mut env).unwrap();
    assert_eq!(env.realized.len(), 1, "empty pending set must not reach the environment");
}

#[test]
fn paralysis_blocks_motion_but_not_allowed_actions() {
    let mut body = paralyzable_body();
    body.policy_mut().paralyze(2);

    let paralyzed = Submission::Rejected(RejectionReason::Paralyzed);
    assert_eq!(body.influence_speed(Vec2::X).unwrap(), paralyzed);
    assert_eq!(body.influence_acceleration(Vec2::X).unwrap(), paralyzed);
    assert_eq!(body.influence_action("dig").unwrap(), paralyzed);
    assert_eq!(body.move_in(Vec2::X).unwrap(), paralyzed);
    assert_eq!(body.influence_action("shout").unwrap(), Submission::Accepted);
    assert_eq!(body.pending().len(), 1);
}

#[test]
fn paralysis_wears_off_with_ticks() {
    let mut body = paralyzable_body();
    body.policy_mut().paralyze(2);

    let ctx = TickContext::new(0, 0.1, 1);
    body.tick_policy(&ctx);
    assert!(body.influence_speed(Vec2::X).unwrap().is_rejected());

    body.tick_policy(&ctx.next());
    assert!(!body.policy().is_paralyzed());
    assert!(body.influence_speed(Vec2::X).unwrap().is_accepted());
}

#[test]
fn death_takes_precedence_over_policy() {
    let mut body = paralyzable_body();
    body.policy_mut().paralyze(5);
    body.kill();

    assert_eq!(
        body.influence_action("shout").unwrap(),
        Submission::Rejected(RejectionReason::Dead)
    );
}

#[test]
fn move_in_queues_the_equivalent_speed_influence() {
    let mut body = standard_body();
    assert!(body.move_in(Vec2::new(0.0, -1.0)).unwrap().is_accepted());

    let pending: Vec<_> = body.pending().iter().cloned().collect();
    assert_eq!(pending, vec![Influence::speed(Vec2::new(0.0, -1.0)).unwrap()]);

    // The same request through the influence path is a duplicate.
    assert_eq!(
        body.influence_speed(Vec2::new(0.0, -1.0)).unwrap(),
        Submission::Duplicate
    );
}

fn drive<C: Controllable>(controls: &mut C) -> Vec<Submission> {
    vec![
        controls.influence_speed(Vec2::X).unwrap(),
        controls
            .influence_action(ActionToken::new("climb"))
            .unwrap(),
    ]
}

#[test]
fn agents_drive_bodies_through_controllable() {
    let mut body = standard_body();
    let results = drive(&mut body);
    assert!(results.iter().all(Submission::is_accepted));
    assert_eq!(body.pending().len(), 2);

    body.kill();
    let results = drive(&mut body);
    assert!(results.iter().all(Submission::is_rejected));
}
