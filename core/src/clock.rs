//! Tick clock: owns the current tick and work deferred to the next one.
//!
//! The hosting runtime creates a subject's remains only after the death
//! tick completes, so anything touching them is queued here and run
//! when the clock advances.

use crate::types::{SubjectId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One-shot work scheduled for the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum DeferredTask {
    StripDeathMarker { subject: SubjectId },
}

#[derive(Debug, Clone, Default)]
pub struct TickClock {
    pub current_tick: Tick,
    pending:          VecDeque<DeferredTask>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: DeferredTask) {
        self.pending.push_back(task);
    }

    /// Advance one tick and hand back everything queued before the call.
    /// Tasks scheduled while the caller runs these land on the next tick.
    pub fn advance(&mut self) -> (Tick, Vec<DeferredTask>) {
        self.current_tick += 1;
        (self.current_tick, self.pending.drain(..).collect())
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
