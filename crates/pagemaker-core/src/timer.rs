#![forbid(unsafe_code)]

//! Deferred actions keyed by a host-supplied monotonic clock.
//!
//! There are no threads and no wall clock here: the host passes `now` into
//! both [`DeferredQueue::schedule`] and [`DeferredQueue::drain_due`]. Entries
//! cannot be cancelled; consumers make their deferred actions idempotent
//! (for example by writing absolute values) so that a stale entry firing late
//! is harmless.

use std::time::Duration;

#[derive(Debug, Clone)]
struct Entry<T> {
    deadline: Duration,
    /// Insertion sequence, used to keep ties in FIFO order.
    seq: u64,
    action: T,
}

/// A queue of actions that become due at a deadline.
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` to become due `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: T) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.push(Entry {
            deadline: now.saturating_add(delay),
            seq,
            action,
        });
    }

    /// Remove and return every action whose deadline is at or before `now`,
    /// ordered by deadline, then by scheduling order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<T> {
        if self.entries.iter().all(|e| e.deadline > now) {
            return Vec::new();
        }
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.deadline <= now);
        self.entries = pending;
        due.sort_by_key(|e| (e.deadline, e.seq));
        due.into_iter().map(|e| e.action).collect()
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
