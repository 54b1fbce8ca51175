use core::hash::{Hash, Hasher};
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::InfluenceError;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InfluenceKind {
    Speed,
    Acceleration,
    Action,
}

/// Opaque discrete action requested by an agent (e.g. `"dig"`, `"parachute"`).
///
/// The core never interprets the token; the environment does at realization time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionToken(Cow<'static, str>);

impl ActionToken {
    pub fn new(token: impl Into<Cow<'static, str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for ActionToken {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActionToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InfluencePayload {
    Vector(Vec2),
    Action(ActionToken),
}

/// One requested effect on a body. Immutable; equality and hashing are by value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Influence {
    kind: InfluenceKind,
    payload: InfluencePayload,
}

impl Influence {
    pub fn new(kind: InfluenceKind, payload: InfluencePayload) -> Result<Self, InfluenceError> {
        let invalid = |reason| InfluenceError::InvalidInfluence { kind, reason };
        let payload = match (kind, payload) {
            (InfluenceKind::Speed | InfluenceKind::Acceleration, InfluencePayload::Vector(v)) => {
                if !v.is_finite() {
                    return Err(invalid("vector payload is missing or not finite"));
                }
                InfluencePayload::Vector(canonical(v))
            }
            (InfluenceKind::Action, InfluencePayload::Action(token)) => {
                if token.is_empty() {
                    return Err(invalid("action token is missing"));
                }
                InfluencePayload::Action(token)
            }
            (InfluenceKind::Action, InfluencePayload::Vector(_)) => {
                return Err(invalid("expected an action token, got a vector"));
            }
            (_, InfluencePayload::Action(_)) => {
                return Err(invalid("expected a vector, got an action token"));
            }
        };
        Ok(Self { kind, payload })
    }

    pub fn speed(speed: Vec2) -> Result<Self, InfluenceError> {
        Self::new(InfluenceKind::Speed, InfluencePayload::Vector(speed))
    }

    pub fn acceleration(acceleration: Vec2) -> Result<Self, InfluenceError> {
        Self::new(
            InfluenceKind::Acceleration,
            InfluencePayload::Vector(acceleration),
        )
    }

    pub fn action(token: impl Into<ActionToken>) -> Result<Self, InfluenceError> {
        Self::new(InfluenceKind::Action, InfluencePayload::Action(token.into()))
    }

    pub fn kind(&self) -> InfluenceKind {
        self.kind
    }

    pub fn payload(&self) -> &InfluencePayload {
        &self.payload
    }

    pub fn vector(&self) -> Option<Vec2> {
        match self.payload {
            InfluencePayload::Vector(v) => Some(v),
            InfluencePayload::Action(_) => None,
        }
    }

    pub fn action_token(&self) -> Option<&ActionToken> {
        match &self.payload {
            InfluencePayload::Action(token) => Some(token),
            InfluencePayload::Vector(_) => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        matches!(
            self.kind,
            InfluenceKind::Speed | InfluenceKind::Acceleration
        )
    }
}

// -0.0 and 0.0 must compare and hash the same; NaN never gets past `new`.
fn canonical(v: Vec2) -> Vec2 {
    Vec2::new(v.x + 0.0, v.y + 0.0)
}

impl PartialEq for Influence {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (&self.payload, &other.payload) {
            (InfluencePayload::Vector(a), InfluencePayload::Vector(b)) => {
                a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
            }
            (InfluencePayload::Action(a), InfluencePayload::Action(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Influence {}

impl Hash for Influence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        match &self.payload {
            InfluencePayload::Vector(v) => {
                v.x.to_bits().hash(state);
                v.y.to_bits().hash(state);
            }
            InfluencePayload::Action(token) => token.hash(state),
        }
    }
}

/// Influences submitted during the current tick, with set semantics.
///
/// Kept in submission order so realization is deterministic; sets are small (a handful of
/// entries per body per tick), so membership is a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInfluences {
    items: Vec<Influence>,
}

impl PendingInfluences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an equal influence is already pending.
    pub fn insert(&mut self, influence: Influence) -> bool {
        if self.contains(&influence) {
            return false;
        }
        self.items.push(influence);
        true
    }

    /// Returns `false` when no equal influence was pending.
    pub fn remove(&mut self, influence: &Influence) -> bool {
        match self.items.iter().position(|i| i == influence) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, influence: &Influence) -> bool {
        self.items.iter().any(|i| i == influence)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Influence> {
        self.items.iter()
    }

    pub fn count_kind(&self, kind: InfluenceKind) -> usize {
        self.items.iter().filter(|i| i.kind() == kind).count()
    }

    pub fn as_slice(&self) -> &[Influence] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn take(&mut self) -> Vec<Influence> {
        std::mem::take(&mut self.items)
    }
}
