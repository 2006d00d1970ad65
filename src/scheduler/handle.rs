// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Handles tracking one submitted unit of work.
//!
//! ```text
//!            try_start            begin_delivery        finish
//! Pending ------------> Running ----------------> (delivering) ----> Done(outcome)
//!    |                     |
//!    | cancel()            | cancel(): flag only, unit keeps running,
//!    v                     |           result withdrawn at delivery
//! Withdrawn ---------------+---- worker delivers on_done/on_error ---> Done(Cancelled)
//! ```
//!
//! Waiters wake only on `Done`, after the callbacks of the unit were
//! delivered, whichever path it took.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::worker::Command;

/// Identifier of a submitted unit, unique per [`Scheduler`](super::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-visible state of a submitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Queued and not started, or withdrawn with its cancellation not yet delivered.
    Pending,
    /// The worker is executing the unit or delivering its callbacks.
    Running,
    /// Finished successfully.
    Completed,
    /// Returned an error, panicked, or was interrupted.
    Failed,
    /// Withdrawn before delivery, or abandoned by the scheduler.
    Cancelled,
}

impl TaskState {
    /// Returns whether this state is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Why a unit was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The caller cancelled the handle.
    Withdrawn,
    /// The scheduler abandoned the unit during a forced shutdown.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Withdrawn => write!(f, "withdrawn by caller"),
            Self::Shutdown => write!(f, "scheduler shut down"),
        }
    }
}

/// Final outcome of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The unit returned `Ok`.
    Completed,
    /// The unit returned an error or panicked. The cause itself goes to the
    /// error callback; the handle keeps its rendered message.
    Failed { message: String },
    /// The unit stopped because the worker was interrupted.
    Interrupted,
    /// The unit was cancelled.
    Cancelled(CancelReason),
}

impl Outcome {
    /// Maps the outcome onto the coarse handle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        match self {
            Self::Completed => TaskState::Completed,
            Self::Failed { .. } | Self::Interrupted => TaskState::Failed,
            Self::Cancelled(_) => TaskState::Cancelled,
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[derive(Debug)]
enum Phase {
    Pending,
    /// Cancelled before start; the worker has not delivered the cancellation yet.
    Withdrawn(CancelReason),
    Running { cancel_requested: bool },
    Delivering,
    Done(Outcome),
}

/// Result of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelRequest {
    /// The unit had not started and never will.
    Withdrawn,
    /// The unit is running; its result will be withdrawn.
    Flagged,
    /// Delivery already started or the unit is done.
    TooLate,
}

/// State shared between a [`Handle`] and the worker.
#[derive(Debug)]
pub(crate) struct TaskShared {
    id: TaskId,
    phase: Mutex<Phase>,
    finished: Condvar,
}

impl TaskShared {
    pub(crate) const fn new(id: TaskId) -> Self {
        Self {
            id,
            phase: Mutex::new(Phase::Pending),
            finished: Condvar::new(),
        }
    }

    pub(crate) const fn id(&self) -> TaskId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `Pending` to `Running`, or returns why the unit must not start.
    pub(crate) fn try_start(&self) -> Result<(), CancelReason> {
        let mut phase = self.lock();
        match &*phase {
            Phase::Pending => {
                *phase = Phase::Running {
                    cancel_requested: false,
                };
                Ok(())
            }
            Phase::Withdrawn(reason) | Phase::Done(Outcome::Cancelled(reason)) => Err(*reason),
            _ => Err(CancelReason::Withdrawn),
        }
    }

    /// Closes the cancellation window. Returns whether cancellation was
    /// requested while the unit ran.
    pub(crate) fn begin_delivery(&self) -> bool {
        let mut phase = self.lock();
        let cancel_requested = matches!(
            *phase,
            Phase::Running {
                cancel_requested: true
            }
        );
        *phase = Phase::Delivering;
        cancel_requested
    }

    /// Records the final outcome once; later calls are ignored.
    pub(crate) fn finish(&self, outcome: Outcome) {
        let mut phase = self.lock();
        if !matches!(*phase, Phase::Done(_)) {
            *phase = Phase::Done(outcome);
        }
        drop(phase);
        self.finished.notify_all();
    }

    /// Marks a unit the scheduler is abandoning, returning the effective
    /// reason. The caller delivers the cancellation and then calls
    /// [`finish`](Self::finish).
    pub(crate) fn settle_cancelled(&self, reason: CancelReason) -> CancelReason {
        let mut phase = self.lock();
        match &*phase {
            Phase::Withdrawn(existing) | Phase::Done(Outcome::Cancelled(existing)) => *existing,
            _ => {
                *phase = Phase::Withdrawn(reason);
                reason
            }
        }
    }

    pub(crate) fn request_cancel(&self) -> CancelRequest {
        let mut phase = self.lock();
        match &*phase {
            Phase::Pending => {
                *phase = Phase::Withdrawn(CancelReason::Withdrawn);
                CancelRequest::Withdrawn
            }
            Phase::Running { .. } => {
                *phase = Phase::Running {
                    cancel_requested: true,
                };
                CancelRequest::Flagged
            }
            Phase::Withdrawn(_) | Phase::Delivering | Phase::Done(_) => CancelRequest::TooLate,
        }
    }

    /// Returns whether the unit was cancelled before it started and still
    /// awaits its cancellation callbacks.
    pub(crate) fn is_withdrawn(&self) -> bool {
        matches!(*self.lock(), Phase::Withdrawn(_))
    }

    pub(crate) fn state(&self) -> TaskState {
        match &*self.lock() {
            Phase::Pending | Phase::Withdrawn(_) => TaskState::Pending,
            Phase::Running { .. } | Phase::Delivering => TaskState::Running,
            Phase::Done(outcome) => outcome.state(),
        }
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        match &*self.lock() {
            Phase::Done(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }

    fn wait(&self) -> Outcome {
        let mut phase = self.lock();
        loop {
            if let Phase::Done(outcome) = &*phase {
                return outcome.clone();
            }
            phase = self
                .finished
                .wait(phase)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let (phase, _) = self
            .finished
            .wait_timeout_while(self.lock(), timeout, |phase| {
                !matches!(phase, Phase::Done(_))
            })
            .unwrap_or_else(PoisonError::into_inner);
        match &*phase {
            Phase::Done(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }
}

/// Caller-visible token for one submission.
///
/// Cloning a handle yields another view of the same submission. Dropping
/// every handle does not cancel the unit.
#[derive(Clone)]
pub struct Handle {
    task: Arc<TaskShared>,
    waker: Option<flume::WeakSender<Command>>,
}

impl Handle {
    pub(crate) const fn new(task: Arc<TaskShared>, waker: Option<flume::WeakSender<Command>>) -> Self {
        Self { task, waker }
    }

    /// Returns the submission id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    /// Returns the current state. May be stale by the time it is read.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    /// Returns the outcome if the unit is done.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.task.outcome()
    }

    /// Returns whether [`wait`](Self::wait) would return without blocking.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests cancellation.
    ///
    /// A pending unit is withdrawn and never runs; the worker delivers
    /// `on_done` and the cancellation to `on_error`, then settles the
    /// handle, without waiting for the unit's delay. A running unit keeps
    /// running, but its result is withdrawn: `on_done` still runs, and the
    /// error callback receives a cancellation instead of the result.
    ///
    /// Returns `false` if the unit already finished or is delivering its
    /// callbacks.
    pub fn cancel(&self) -> bool {
        match self.task.request_cancel() {
            CancelRequest::Withdrawn => {
                tracing::debug!(task = %self.id(), "Task withdrawn before start");
                // Wake the worker so withdrawn callbacks are not held back by a
                // long delay.
                if let Some(sender) = self.waker.as_ref().and_then(flume::WeakSender::upgrade) {
                    let _ = sender.send(Command::Purge);
                }
                true
            }
            CancelRequest::Flagged => {
                tracing::debug!(task = %self.id(), "Cancellation requested for running task");
                true
            }
            CancelRequest::TooLate => false,
        }
    }

    /// Blocks until the unit reaches a terminal state.
    ///
    /// With [`Delivery::Worker`](super::Delivery::Worker) the callbacks have
    /// run by the time this returns.
    #[must_use]
    pub fn wait(&self) -> Outcome {
        self.task.wait()
    }

    /// Blocks up to `timeout`; returns `None` if the unit is still unfinished.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        self.task.wait_timeout(timeout)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
