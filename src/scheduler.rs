//! Discrete-event scheduler
//!
//! Replaces wall-clock timers with a min-heap keyed by `(fire_at, sequence)`,
//! so a feed can be run deterministically at any speed. Ties fire in the
//! order they were scheduled.

use crate::feed::PlaceholderId;
use crate::simulator::RowId;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Simulated milliseconds since the feed started
pub type Millis = u64;

/// Something that must happen at a given simulated time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScheduledEvent {
    /// A row's next phase transition is due
    RowDue(RowId),
    /// A placeholder should be swapped for its replacement row
    ReplacementDue(PlaceholderId),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<(Millis, u64, ScheduledEvent)>>,
    sequence: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: Millis, event: ScheduledEvent) {
        self.heap.push(Reverse((fire_at, self.sequence, event)));
        self.sequence += 1;
    }

    /// Pop the earliest event if it is due at `now`
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, ScheduledEvent)> {
        let due = matches!(self.heap.peek(), Some(Reverse((fire_at, _, _))) if *fire_at <= now);
        if !due {
            return None;
        }
        let Reverse((fire_at, _, event)) = self.heap.pop()?;
        Some((fire_at, event))
    }

    /// Fire time of the earliest pending event
    pub fn next_fire_at(&self) -> Option<Millis> {
        self.heap.peek().map(|Reverse((fire_at, _, _))| *fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
