use crate::{BodyId, SplitMix64};

/// Per-tick inputs shared by every body and agent in one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32, seed: u64) -> Self {
        Self {
            tick,
            dt_seconds,
            seed,
        }
    }

    /// Deterministic RNG stream for one body on this tick.
    pub fn rng_for_body(&self, body: BodyId, stream: u64) -> SplitMix64 {
        SplitMix64::for_body(self.seed, self.tick, body, stream)
    }

    pub fn next(&self) -> Self {
        Self {
            tick: self.tick + 1,
            ..*self
        }
    }
}
