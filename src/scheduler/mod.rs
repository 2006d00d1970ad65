// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operation scheduler: the single serialization point for Git actions.
//!
//! ```text
//! GUI / callers                      Scheduler (Clone, shared)
//!   schedule_now ----------+            |
//!   schedule_after --------+--> submit -+--> current Worker (lazy)
//!   schedule_with_callbacks+            |      flume --> ReadyQueue
//!   schedule_with_result --+            |      one unit at a time
//!        |                              |
//!        v                              +--> retired Workers (draining)
//!     Handle  <--- state / wait / cancel
//!
//! Lifecycle:
//!   Stopped --submit--> Running --shutdown--> Draining --quiesced--> Stopped
//!                          ^                     |
//!                          +------submit---------+  (fresh worker waits
//!                                                    for the old one)
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Scheduler`] | Owns the worker, exposes the scheduling operations |
//! | [`Submission`] | Unit of work plus delay, callbacks and [`Delivery`] |
//! | [`Handle`] | Tracks one submission: state, outcome, wait, cancel |
//! | [`Outcome`] | Tagged result: completed, failed, interrupted, cancelled |
//! | [`CallbackQueue`] | Inbox for callbacks delivered to the submitter's loop |
//!
//! At most one unit runs at any instant, across worker generations. Units
//! never see errors thrown back at the submitter: every outcome arrives
//! through the handle or the callbacks.

mod delivery;
mod handle;
mod job;
mod queue;
mod worker;


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use flume::RecvTimeoutError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::types::SchedulerConfig;
use crate::error::{Result, TaskError};

pub use delivery::{Callback, CallbackQueue, Delivery, Dispatcher};
pub use handle::{CancelReason, Handle, Outcome, TaskId, TaskState};
pub use job::{DoneCallback, ErrorCallback, ResultCallback, Submission, WorkFn};
pub use worker::{current_task, ensure_not_interrupted, interrupt_token};

use handle::TaskShared;
use job::Runnable;
use queue::Entry;
use worker::{Command, StopMode, Worker, WorkerShared};

/// Lifecycle state of the scheduler's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// A worker accepts submissions.
    Running,
    /// Shutdown was requested and a worker is still finishing its queue.
    Draining,
    /// No worker is alive. The next submission starts one.
    Stopped,
}

/// Result of an interruptible shutdown wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownStatus {
    /// Every worker finished.
    Quiesced,
    /// The timeout elapsed first; work may still be draining.
    TimedOut,
    /// The wait was interrupted; the shutdown request stays in effect.
    Interrupted,
}

impl ShutdownStatus {
    #[must_use]
    pub const fn is_quiesced(self) -> bool {
        matches!(self, Self::Quiesced)
    }
}

#[derive(Default)]
struct Slot {
    current: Option<Worker>,
    retired: Vec<Worker>,
    generation: u64,
    next_id: u64,
}

impl Slot {
    fn prune_retired(&mut self) {
        self.retired.retain(|worker| !worker.is_finished());
    }
}

struct Inner {
    worker_name: String,
    shutdown_timeout: Duration,
    shared: Arc<WorkerShared>,
    slot: Mutex<Slot>,
    submitted: AtomicU64,
}

/// Serializes units of work onto one dedicated worker thread.
///
/// Create one per process and pass clones to every call site that touches
/// the repository. Clones share the same worker.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Creates a scheduler with default settings. No thread is started
    /// until the first submission.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                worker_name: config.worker_name.clone(),
                shutdown_timeout: config.shutdown_timeout(),
                shared: Arc::new(WorkerShared::default()),
                slot: Mutex::new(Slot::default()),
                submitted: AtomicU64::new(0),
            }),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `work` to run as soon as everything queued before it is done.
    pub fn schedule_now<F>(&self, work: F) -> Handle
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(Submission::new(work))
    }

    /// Queues `work` to become eligible after `delay`.
    pub fn schedule_after<F>(&self, work: F, delay: Duration) -> Handle
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(Submission::new(work).with_delay(delay))
    }

    /// Queues `work`; afterwards `on_done` (if any) runs, then `on_error`
    /// receives the cause if `work` failed. Both run on the worker thread.
    pub fn schedule_with_callbacks<F, E>(
        &self,
        work: F,
        on_done: Option<DoneCallback>,
        on_error: E,
    ) -> Handle
    where
        F: FnOnce() -> Result<()> + Send + 'static,
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.submit(
            Submission::new(work)
                .on_done_boxed(on_done)
                .on_error(on_error),
        )
    }

    /// Queues `computation`; exactly one of `on_result` / `on_error` is
    /// invoked, once, on the worker thread.
    pub fn schedule_with_result<T, F, R, E>(&self, computation: F, on_result: R, on_error: E) -> Handle
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
        R: FnOnce(T) + Send + 'static,
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.submit(
            Submission::new(computation)
                .on_result(on_result)
                .on_error(on_error),
        )
    }

    /// Queues a fully configured submission.
    ///
    /// Starts a fresh worker if none is accepting work. Never blocks on the
    /// worker and never fails synchronously.
    pub fn submit<T: Send + 'static>(&self, submission: Submission<T>) -> Handle {
        let delay = submission.delay();
        let mut slot = self.lock_slot();
        slot.prune_retired();

        slot.next_id += 1;
        let id = TaskId::new(slot.next_id);
        let task = Arc::new(TaskShared::new(id));
        debug!(task = %id, label = submission.label().unwrap_or_default(), delay_ms = delay.as_millis(), "Scheduling task");

        let job: Box<dyn Runnable> = Box::new(submission);
        // A current worker only finishes on its own if its loop died.
        if slot.current.as_ref().is_some_and(Worker::is_finished) {
            warn!("Git operation worker vanished, starting a new one");
            slot.current = None;
        }
        let worker = match self.current_worker(&mut slot) {
            Ok(worker) => worker,
            Err(err) => {
                drop(slot);
                error!(error = %err, "Failed to start git operation worker");
                job.reject(&task, TaskError::WorkerSpawn(err).into());
                return Handle::new(task, None);
            }
        };

        let entry = Entry::new(Instant::now() + delay, id.get(), Arc::clone(&task), job);
        let waker = worker.waker();
        self.inner.shared.enqueued();
        if let Err(command) = worker.send(Command::Submit(entry)) {
            self.inner.shared.dequeued(1);
            slot.current = None;
            drop(slot);
            if let Command::Submit(entry) = command {
                entry
                    .job
                    .reject(&entry.task, anyhow::anyhow!("git operation worker exited unexpectedly"));
            }
            return Handle::new(task, None);
        }

        self.inner.submitted.fetch_add(1, Ordering::Relaxed);
        Handle::new(task, Some(waker))
    }

    fn current_worker<'a>(&self, slot: &'a mut Slot) -> std::io::Result<&'a Worker> {
        let worker = match slot.current.take() {
            Some(worker) => worker,
            None => {
                slot.generation += 1;
                let predecessors = slot.retired.iter().map(Worker::done_signal).collect();
                Worker::spawn(
                    &self.inner.worker_name,
                    slot.generation,
                    Arc::clone(&self.inner.shared),
                    predecessors,
                )?
            }
        };
        Ok(slot.current.insert(worker))
    }

    /// Retires the current worker and returns the done signals to wait on.
    fn request_stop(&self, mode: StopMode) -> Vec<flume::Receiver<()>> {
        let mut slot = self.lock_slot();
        slot.prune_retired();

        if let Some(worker) = slot.current.take() {
            info!(generation = worker.generation(), ?mode, "Stopping git operation worker");
            let _ = worker.send(Command::Stop(mode));
            slot.retired.push(worker);
        }
        if mode == StopMode::Abandon {
            for worker in &slot.retired {
                worker.interrupt();
                let _ = worker.send(Command::Stop(StopMode::Abandon));
            }
        }

        slot.retired.iter().map(Worker::done_signal).collect()
    }

    /// Stops accepting work on the current worker, lets it drain its queue,
    /// and blocks up to `timeout` for it to finish.
    ///
    /// Returns `true` iff quiescence was observed in time. The scheduler
    /// stays usable: the next submission starts a new worker.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let signals = self.request_stop(StopMode::Drain);
        Self::await_signals(&signals, timeout)
    }

    /// [`shutdown`](Self::shutdown) with the configured default timeout.
    pub fn shutdown_default(&self) -> bool {
        self.shutdown(self.inner.shutdown_timeout)
    }

    /// Cancels every unit that has not started, raises the worker's
    /// interruption token, and blocks up to `timeout` for it to finish.
    pub fn shutdown_now(&self, timeout: Duration) -> bool {
        let signals = self.request_stop(StopMode::Abandon);
        Self::await_signals(&signals, timeout)
    }

    /// Like [`shutdown`](Self::shutdown), but the wait ends early when
    /// `interrupt` is cancelled. The token is left cancelled.
    pub async fn shutdown_until_cancelled(
        &self,
        timeout: Duration,
        interrupt: &CancellationToken,
    ) -> ShutdownStatus {
        let signals = self.request_stop(StopMode::Drain);
        let all_done = async {
            for signal in &signals {
                let _ = signal.recv_async().await;
            }
        };

        let status = tokio::select! {
            biased;
            () = interrupt.cancelled() => ShutdownStatus::Interrupted,
            () = all_done => ShutdownStatus::Quiesced,
            () = tokio::time::sleep(timeout) => ShutdownStatus::TimedOut,
        };
        match status {
            ShutdownStatus::Quiesced => debug!("Git operation worker quiesced"),
            ShutdownStatus::TimedOut => {
                warn!(timeout_ms = timeout.as_millis(), "Git operation worker still draining");
            }
            ShutdownStatus::Interrupted => warn!("Interrupted while waiting for git operations to stop"),
        }
        status
    }

    fn await_signals(signals: &[flume::Receiver<()>], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let quiesced = signals.iter().all(|signal| {
            !matches!(signal.recv_deadline(deadline), Err(RecvTimeoutError::Timeout))
        });
        if quiesced {
            debug!("Git operation worker quiesced");
        } else {
            warn!(timeout_ms = timeout.as_millis(), "Git operation worker still draining");
        }
        quiesced
    }

    /// Queues a no-op marker and waits for it.
    ///
    /// Returns `true` once every unit that was ready before the call has run.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.submit(Submission::new(|| Ok(())).with_label("flush"))
            .wait_timeout(timeout)
            .is_some()
    }

    /// Approximate number of units executing right now (0 or 1).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.shared.active()
    }

    /// Approximate number of queued units that have not started.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.shared.queued()
    }

    /// Number of submissions accepted so far.
    #[must_use]
    pub fn submitted_count(&self) -> u64 {
        self.inner.submitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        let mut slot = self.lock_slot();
        slot.prune_retired();
        if slot.current.is_some() {
            SchedulerState::Running
        } else if slot.retired.is_empty() {
            SchedulerState::Stopped
        } else {
            SchedulerState::Draining
        }
    }

    /// Default timeout used by [`shutdown_default`](Self::shutdown_default).
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.inner.shutdown_timeout
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("worker_name", &self.inner.worker_name)
            .field("state", &self.state())
            .field("active", &self.active_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}
