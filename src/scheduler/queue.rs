// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! FIFO-by-readiness queue owned by a worker thread.
//!
//! Entries are ordered by `(ready_at, seq)`: the earliest ready time wins,
//! and submission order breaks ties.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;

use super::handle::TaskShared;
use super::job::Runnable;

/// One queued unit.
pub(crate) struct Entry {
    ready_at: Instant,
    seq: u64,
    pub(crate) task: Arc<TaskShared>,
    pub(crate) job: Box<dyn Runnable>,
}

impl Entry {
    pub(crate) fn new(
        ready_at: Instant,
        seq: u64,
        task: Arc<TaskShared>,
        job: Box<dyn Runnable>,
    ) -> Self {
        Self {
            ready_at,
            seq,
            task,
            job,
        }
    }

    pub(crate) const fn ready_at(&self) -> Instant {
        self.ready_at
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at == other.ready_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap yields the earliest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ready_at
            .cmp(&self.ready_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Delay-aware queue.
#[derive(Default)]
pub(crate) struct ReadyQueue {
    heap: BinaryHeap<Entry>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.heap.push(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Ready time of the earliest entry.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(Entry::ready_at)
    }

    /// Pops the earliest entry if it is ready at `now`.
    pub(crate) fn pop_ready(&mut self, now: Instant) -> Option<Entry> {
        if self.heap.peek()?.ready_at <= now {
            self.heap.pop()
        } else {
            None
        }
    }

    /// Removes entries whose handle was cancelled before they started.
    pub(crate) fn take_withdrawn(&mut self) -> Vec<Entry> {
        let (withdrawn, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|entry| entry.task.is_withdrawn());
        self.heap = kept.into();
        withdrawn
    }

    /// Removes every entry in execution order.
    pub(crate) fn drain_ordered(&mut self) -> Vec<Entry> {
        let mut entries = std::mem::take(&mut self.heap).into_sorted_vec();
        // into_sorted_vec is ascending by Ord, which is reversed readiness.
        entries.reverse();
        entries
    }
}
