// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The dedicated worker thread.
//!
//! ```text
//! Scheduler --Command::Submit/Purge/Stop--> flume channel
//!                                               |
//!                                               v
//!                               WorkerLoop (one OS thread)
//!                                 wait for retired generations to exit
//!                                 try_iter: take every queued command
//!                                 ReadyQueue (ready_at, seq)
//!                                 pop_ready -> run one unit
//!                                 recv_deadline(next ready time) when idle
//!
//! Stop(Drain)    finish everything queued, then exit
//! Stop(Abandon)  cancel everything not started, then exit
//! exit           drops the done sender -> quiescence observed
//! ```
//!
//! A generation runs nothing until every earlier generation has exited, so
//! units queued before a shutdown always run before units queued after it.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use flume::RecvTimeoutError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::handle::{CancelReason, TaskId};
use super::queue::{Entry, ReadyQueue};
use crate::error::{Result, TaskError};

thread_local! {
    static INTERRUPT: RefCell<Option<CancellationToken>> = const { RefCell::new(None) };
    static CURRENT_TASK: Cell<Option<TaskId>> = const { Cell::new(None) };
}

/// Returns the interruption token of the worker running the calling unit.
///
/// `None` outside a worker thread. The token is cancelled by
/// [`Scheduler::shutdown_now`](super::Scheduler::shutdown_now) and is never
/// reset for that worker.
#[must_use]
pub fn interrupt_token() -> Option<CancellationToken> {
    INTERRUPT.with(|token| token.borrow().clone())
}

/// Returns the id of the unit currently running on this thread.
#[must_use]
pub fn current_task() -> Option<TaskId> {
    CURRENT_TASK.with(Cell::get)
}

/// Fails with [`TaskError::Interrupted`] if the current worker was interrupted.
///
/// Long-running units call this between steps to stop cooperatively.
///
/// # Errors
///
/// Returns `TaskError::Interrupted` once the worker's token is cancelled.
pub fn ensure_not_interrupted() -> Result<()> {
    let interrupted = INTERRUPT.with(|token| {
        token
            .borrow()
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    });
    match (interrupted, current_task()) {
        (true, Some(id)) => Err(TaskError::Interrupted { id }.into()),
        _ => Ok(()),
    }
}

/// Messages from the scheduler to a worker.
pub(crate) enum Command {
    Submit(Entry),
    /// Some handle was withdrawn; drop cancelled entries now.
    Purge,
    Stop(StopMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopMode {
    Drain,
    Abandon,
}

/// Counters shared by every worker generation of one scheduler.
#[derive(Debug, Default)]
pub(crate) struct WorkerShared {
    active: AtomicUsize,
    queued: AtomicUsize,
}

impl WorkerShared {
    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub(crate) fn enqueued(&self) {
        self.queued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn dequeued(&self, count: usize) {
        self.queued.fetch_sub(count, Ordering::SeqCst);
    }
}

/// Scheduler-side view of one worker generation.
pub(crate) struct Worker {
    generation: u64,
    tx: flume::Sender<Command>,
    done: flume::Receiver<()>,
    interrupt: CancellationToken,
}

impl Worker {
    /// Starts generation `generation`. It waits for every `predecessors`
    /// signal to disconnect before running its first unit.
    pub(crate) fn spawn(
        name: &str,
        generation: u64,
        shared: Arc<WorkerShared>,
        predecessors: Vec<flume::Receiver<()>>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = flume::unbounded();
        let (done_tx, done) = flume::bounded::<()>(0);
        let interrupt = CancellationToken::new();

        let token = interrupt.clone();
        thread::Builder::new()
            .name(format!("{name}-{generation}"))
            .spawn(move || {
                // Dropped on exit; receivers then observe quiescence.
                let _done = done_tx;
                INTERRUPT.with(|slot| *slot.borrow_mut() = Some(token));
                WorkerLoop {
                    generation,
                    rx,
                    queue: ReadyQueue::new(),
                    shared,
                    predecessors,
                    stopping: None,
                    disconnected: false,
                }
                .run();
            })?;

        info!(generation, "Started git operation worker");
        Ok(Self {
            generation,
            tx,
            done,
            interrupt,
        })
    }

    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Sends a command, handing it back if the worker is gone.
    pub(crate) fn send(&self, command: Command) -> std::result::Result<(), Command> {
        self.tx.send(command).map_err(|flume::SendError(command)| command)
    }

    pub(crate) fn waker(&self) -> flume::WeakSender<Command> {
        self.tx.downgrade()
    }

    pub(crate) fn interrupt(&self) {
        self.interrupt.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.done.is_disconnected()
    }

    /// Receiver that disconnects when the worker thread exits.
    pub(crate) fn done_signal(&self) -> flume::Receiver<()> {
        self.done.clone()
    }
}

struct WorkerLoop {
    generation: u64,
    rx: flume::Receiver<Command>,
    queue: ReadyQueue,
    shared: Arc<WorkerShared>,
    predecessors: Vec<flume::Receiver<()>>,
    stopping: Option<StopMode>,
    /// Every sender is gone; only the queue is left to drain.
    disconnected: bool,
}

impl WorkerLoop {
    fn run(mut self) {
        self.await_predecessors();
        loop {
            // Everything submitted so far competes by readiness, not by
            // arrival in the channel.
            while let Ok(command) = self.rx.try_recv() {
                self.handle(command);
            }

            match self.stopping {
                Some(StopMode::Abandon) => {
                    self.abandon_all();
                    break;
                }
                Some(StopMode::Drain) if self.queue.is_empty() => break,
                _ => {}
            }

            if let Some(entry) = self.queue.pop_ready(Instant::now()) {
                self.execute(entry);
                continue;
            }

            let received = match self.queue.next_deadline() {
                Some(deadline) if self.disconnected => {
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    None
                }
                Some(deadline) => match self.rx.recv_deadline(deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        self.disconnected = true;
                        self.stopping.get_or_insert(StopMode::Drain);
                        None
                    }
                },
                None => match self.rx.recv() {
                    Ok(command) => Some(command),
                    Err(flume::RecvError::Disconnected) => {
                        self.disconnected = true;
                        self.stopping.get_or_insert(StopMode::Drain);
                        None
                    }
                },
            };

            if let Some(command) = received {
                self.handle(command);
            }
        }
        debug!(generation = self.generation, "Git operation worker stopped");
    }

    /// Blocks until every earlier generation has exited.
    fn await_predecessors(&mut self) {
        let predecessors = std::mem::take(&mut self.predecessors);
        if predecessors.is_empty() {
            return;
        }
        debug!(generation = self.generation, count = predecessors.len(), "Waiting for retired workers");
        for signal in predecessors {
            // Never sent on; returns once the sender's thread exits.
            let _ = signal.recv();
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Submit(entry) => {
                trace!(task = %entry.task.id(), "Task queued");
                self.queue.push(entry);
            }
            Command::Purge => {
                let withdrawn = self.queue.take_withdrawn();
                self.shared.dequeued(withdrawn.len());
                for entry in withdrawn {
                    entry.job.abandon(&entry.task, CancelReason::Withdrawn);
                }
            }
            Command::Stop(mode) => {
                debug!(generation = self.generation, ?mode, pending = self.queue.len(), "Worker asked to stop");
                // Abandon wins over an earlier drain request.
                if self.stopping != Some(StopMode::Abandon) {
                    self.stopping = Some(mode);
                }
            }
        }
    }

    fn execute(&self, entry: Entry) {
        self.shared.dequeued(1);
        if let Err(reason) = entry.task.try_start() {
            entry.job.abandon(&entry.task, reason);
            return;
        }

        self.shared.active.fetch_add(1, Ordering::SeqCst);
        CURRENT_TASK.with(|current| current.set(Some(entry.task.id())));
        entry.job.run(&entry.task);
        CURRENT_TASK.with(|current| current.set(None));
        self.shared.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn abandon_all(&mut self) {
        let mut entries = self.queue.drain_ordered();
        // Submissions still in flight never reach the queue.
        entries.extend(self.rx.try_iter().filter_map(|command| match command {
            Command::Submit(entry) => Some(entry),
            Command::Purge | Command::Stop(_) => None,
        }));

        if !entries.is_empty() {
            info!(generation = self.generation, count = entries.len(), "Abandoning queued tasks");
        }
        self.shared.dequeued(entries.len());
        for entry in entries {
            let reason = entry.task.settle_cancelled(CancelReason::Shutdown);
            entry.job.abandon(&entry.task, reason);
        }
    }
}
