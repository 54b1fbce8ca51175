#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use embody_core::{BodyId, RejectionReason, Submission};

/// What a trace event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TraceKind {
    /// `count` = entries kept after filtering.
    Perceived,
    PerceptionPartial,
    InfluenceAccepted,
    InfluenceDuplicate,
    /// `detail` = rejection reason.
    InfluenceRejected,
    /// `count` = influences handed to the environment.
    InfluenceRealized,
    /// `count` = influences dropped because the body was dead.
    InfluenceDiscarded,
    Killed,
    Revived,
}

/// One arbitration decision. Plain data so it can be recorded during a tick and rendered later.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub body: u64,
    pub kind: TraceKind,
    pub count: u64,
    pub detail: Cow<'static, str>,
}

impl TraceEvent {
    pub fn new(tick: u64, body: BodyId, kind: TraceKind) -> Self {
        Self {
            tick,
            body: body.stable_id(),
            kind,
            count: 0,
            detail: Cow::Borrowed(""),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Event describing the outcome of a submission entry point.
    pub fn submission(tick: u64, body: BodyId, submission: &Submission) -> Self {
        match submission {
            Submission::Accepted => Self::new(tick, body, TraceKind::InfluenceAccepted),
            Submission::Duplicate => Self::new(tick, body, TraceKind::InfluenceDuplicate),
            Submission::Rejected(reason) => Self::new(tick, body, TraceKind::InfluenceRejected)
                .with_detail(rejection_label(reason)),
        }
    }
}

pub fn rejection_label(reason: &RejectionReason) -> Cow<'static, str> {
    match reason {
        RejectionReason::Dead => Cow::Borrowed("dead"),
        RejectionReason::Paralyzed => Cow::Borrowed("paralyzed"),
        RejectionReason::Constrained(why) => why.clone(),
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

impl<S: TraceSink + ?Sized> TraceSink for Box<S> {
    fn emit(&mut self, event: TraceEvent) {
        (**self).emit(event)
    }
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        tracing::debug!(
            tick = event.tick,
            body = event.body,
            kind = ?event.kind,
            count = event.count,
            detail = %event.detail,
            "arbitration"
        );
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn count(&self, kind: TraceKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn for_body(&self, body: BodyId) -> impl Iterator<Item = &TraceEvent> {
        let id = body.stable_id();
        self.events.iter().filter(move |e| e.body == id)
    }

    pub fn in_tick(&self, tick: u64) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(move |e| e.tick == tick)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
