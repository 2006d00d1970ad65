// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Submissions and how the worker runs them.
//!
//! ```text
//! Submission<T>
//!   work: FnOnce() -> Result<T>
//!   delay, label, delivery
//!   on_done?  on_result?  on_error?
//!        |
//!        v  (type-erased as Box<dyn Runnable>)
//! run():     catch_unwind(work) -> classify -> log -> callbacks -> finish
//! abandon(): on_done -> on_error(Cancelled) -> finish
//! ```
//!
//! Callback order is fixed: `on_done` first, then exactly one of
//! `on_result` / `on_error`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::delivery::Delivery;
use super::handle::{CancelReason, Outcome, TaskId, TaskShared};
use crate::error::{Result, TaskError};

/// Unit of work producing `T`.
pub type WorkFn<T> = Box<dyn FnOnce() -> Result<T> + Send + 'static>;

/// Runs once the attempt is over, before the result or error is delivered.
pub type DoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// Receives the value of a successful unit.
pub type ResultCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Receives the cause of a failed or cancelled unit.
pub type ErrorCallback = Box<dyn FnOnce(anyhow::Error) + Send + 'static>;

/// A unit of work together with its scheduling options and callbacks.
pub struct Submission<T> {
    work: WorkFn<T>,
    delay: Duration,
    label: Option<String>,
    delivery: Delivery,
    on_done: Option<DoneCallback>,
    on_result: Option<ResultCallback<T>>,
    on_error: Option<ErrorCallback>,
}

impl<T: Send + 'static> Submission<T> {
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            work: Box::new(work),
            delay: Duration::ZERO,
            label: None,
            delivery: Delivery::Worker,
            on_done: None,
            on_result: None,
            on_error: None,
        }
    }

    /// Makes the unit eligible only after `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Names the unit in log output.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Chooses where callbacks run.
    #[must_use]
    pub fn deliver_on(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    #[must_use]
    pub fn on_done<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_done = Some(Box::new(callback));
        self
    }

    /// Like [`on_done`](Self::on_done) for an optional, already boxed callback.
    #[must_use]
    pub fn on_done_boxed(mut self, callback: Option<DoneCallback>) -> Self {
        self.on_done = callback;
        self
    }

    #[must_use]
    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub(crate) const fn delay(&self) -> Duration {
        self.delay
    }

    pub(crate) fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn split(self, id: TaskId) -> (WorkFn<T>, Callbacks<T>, Delivery) {
        let callbacks = Callbacks {
            id,
            on_done: self.on_done,
            on_result: self.on_result,
            on_error: self.on_error,
        };
        (self.work, callbacks, self.delivery)
    }
}

/// Type-erased submission as seen by the worker.
pub(crate) trait Runnable: Send {
    /// Runs the unit and delivers its outcome. Never panics.
    fn run(self: Box<Self>, task: &TaskShared);

    /// Drops the unit without running it, reporting cancellation.
    fn abandon(self: Box<Self>, task: &TaskShared, reason: CancelReason);

    /// Fails the unit without running it.
    fn reject(self: Box<Self>, task: &TaskShared, cause: anyhow::Error);
}

impl<T: Send + 'static> Runnable for Submission<T> {
    fn run(self: Box<Self>, task: &TaskShared) {
        let id = task.id();
        let label = self.label.clone().unwrap_or_default();
        let _span = tracing::debug_span!("task", id = %id, label = %label).entered();

        let (work, callbacks, delivery) = self.split(id);
        let started = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(result) => result,
            Err(payload) => Err(anyhow::Error::new(TaskError::Panicked {
                id,
                message: panic_message(payload.as_ref()),
            })),
        };
        let elapsed_ms = started.elapsed().as_millis();

        let withdrawn = task.begin_delivery();
        let (outcome, result) = if withdrawn {
            debug!(elapsed_ms, "Task finished after cancellation, result withdrawn");
            let reason = CancelReason::Withdrawn;
            (
                Outcome::Cancelled(reason),
                Err(anyhow::Error::new(TaskError::Cancelled { id, reason })),
            )
        } else {
            match result {
                Ok(value) => {
                    debug!(elapsed_ms, "Task completed");
                    (Outcome::Completed, Ok(value))
                }
                Err(err) if TaskError::is_interruption(&err) => {
                    warn!(elapsed_ms, "Task interrupted");
                    (Outcome::Interrupted, Err(err))
                }
                Err(err) => {
                    if callbacks.on_error.is_some() {
                        debug!(elapsed_ms, error = %format!("{err:#}"), "Task failed, reporting to error handler");
                    } else {
                        error!(elapsed_ms, error = %format!("{err:#}"), "Task failed");
                    }
                    let message = format!("{err:#}");
                    (Outcome::Failed { message }, Err(err))
                }
            }
        };

        callbacks.deliver(&delivery, result);
        task.finish(outcome);
    }

    fn abandon(self: Box<Self>, task: &TaskShared, reason: CancelReason) {
        let id = task.id();
        debug!(task = %id, label = self.label().unwrap_or_default(), %reason, "Task cancelled before start");
        let (_, callbacks, delivery) = self.split(id);
        callbacks.deliver(
            &delivery,
            Err(anyhow::Error::new(TaskError::Cancelled { id, reason })),
        );
        task.finish(Outcome::Cancelled(reason));
    }

    fn reject(self: Box<Self>, task: &TaskShared, cause: anyhow::Error) {
        let id = task.id();
        let message = format!("{cause:#}");
        error!(task = %id, error = %message, "Task rejected");
        let (_, callbacks, delivery) = self.split(id);
        callbacks.deliver(&delivery, Err(cause));
        task.finish(Outcome::Failed { message });
    }
}

struct Callbacks<T> {
    id: TaskId,
    on_done: Option<DoneCallback>,
    on_result: Option<ResultCallback<T>>,
    on_error: Option<ErrorCallback>,
}

impl<T: Send + 'static> Callbacks<T> {
    const fn is_empty(&self) -> bool {
        self.on_done.is_none() && self.on_result.is_none() && self.on_error.is_none()
    }

    fn deliver(self, delivery: &Delivery, result: Result<T>) {
        if self.is_empty() {
            return;
        }
        match delivery {
            Delivery::Worker => self.invoke(result),
            Delivery::Dispatch(dispatcher) => {
                dispatcher.dispatch(Box::new(move || self.invoke(result)));
            }
        }
    }

    fn invoke(self, result: Result<T>) {
        let id = self.id;
        if let Some(on_done) = self.on_done {
            guarded(id, "on_done", on_done);
        }
        match result {
            Ok(value) => {
                if let Some(on_result) = self.on_result {
                    guarded(id, "on_result", move || on_result(value));
                }
            }
            Err(err) => {
                if let Some(on_error) = self.on_error {
                    guarded(id, "on_error", move || on_error(err));
                }
            }
        }
    }
}

/// Runs a caller-supplied callback, containing any panic.
fn guarded(id: TaskId, callback: &'static str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(
            task = %id,
            callback,
            panic = %panic_message(payload.as_ref()),
            "Callback panicked"
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
