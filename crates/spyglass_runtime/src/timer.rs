//! Deadline-ordered timer queue
//!
//! Stands in for "run after N milliseconds". Timers are plain data keyed by
//! [`TimerId`]; the owner polls [`TimerQueue::take_due`] with the current time
//! and acts on whatever comes back.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerId;
}

#[derive(Debug, Clone)]
struct Timer<T> {
    deadline_ms: u64,
    task: T,
}

/// Pending timers carrying a task payload
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerId, Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
        }
    }

    /// Schedule `task` to become due at `deadline_ms`
    pub fn schedule(&mut self, deadline_ms: u64, task: T) -> TimerId {
        self.timers.insert(Timer { deadline_ms, task })
    }

    /// Cancel a timer, returning its task if it was still pending
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(id).map(|timer| timer.task)
    }

    /// Whether a timer is still pending
    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|timer| timer.deadline_ms).min()
    }

    /// Remove and return every timer due at `now_ms`, earliest first
    pub fn take_due(&mut self, now_ms: u64) -> SmallVec<[(TimerId, T); 4]> {
        let mut due: SmallVec<[(TimerId, u64); 4]> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline_ms <= now_ms)
            .map(|(id, timer)| (id, timer.deadline_ms))
            .collect();
        due.sort_by_key(|&(_, deadline)| deadline);

        due.into_iter()
            .filter_map(|(id, _)| self.timers.remove(id).map(|timer| (id, timer.task)))
            .collect()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
