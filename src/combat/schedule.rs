//! Deferred actions for the combat loop
//!
//! Reload completion, corpse removal and cosmetic resets are queued here and
//! drained by the session at the start of each tick. There is no cancellation:
//! whoever handles an action must check the target still exists first.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use super::weapons::WeaponKey;
use crate::enemies::EnemyId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimedAction {
    /// Start reloading a weapon that ran dry
    AutoReload(WeaponKey),
    /// Transfer reserve rounds once the reload time has passed
    FinishReload(WeaponKey),
    /// Drop a dead enemy from the roster (and its visual)
    RemoveEnemy(EnemyId),
    /// Settle an enemy back down after its attack lunge
    EndLunge(EnemyId),
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    action: TimedAction,
}

// Ordered by due time, then by scheduling order
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

/// Min-heap of `(due, action)`
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due: Duration, action: TimedAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled { due, seq, action }));
    }

    /// Pop the earliest action whose due time is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<TimedAction> {
        if self.heap.peek()?.0.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(entry)| entry.action)
    }

    #[cfg(test)]
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether an action is queued at any time
    #[cfg(test)]
    pub fn contains(&self, action: TimedAction) -> bool {
        self.heap.iter().any(|Reverse(entry)| entry.action == action)
    }
}
