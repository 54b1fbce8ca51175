use serde::Serialize;

use embody_core::{BodyId, Perceivable, PerceivableKind, Vec2};

/// Stable identity of anything the sandbox can report. Ordering is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PerceptId {
    Body(BodyId),
    Wall(u32),
    Object(u32),
}

/// Perception entry produced by [`crate::SandboxWorld`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percept {
    pub id: PerceptId,
    pub position: Vec2,
    pub kind: PerceivableKind,
    pub label: Option<String>,
}

impl Perceivable for Percept {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn kind(&self) -> PerceivableKind {
        self.kind
    }
}
