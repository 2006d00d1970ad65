// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Where completion callbacks run.
//!
//! ```text
//! Delivery::Worker             callbacks run on the worker thread
//! Delivery::Dispatch(d)        callbacks are handed to d, e.g. a GUI loop
//!
//! CallbackQueue::new()
//!   .delivery()   --> Delivery::Dispatch(..)   (given to submissions)
//!   .run_pending()                             (pumped by the owner thread)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A deferred callback invocation.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Hands callbacks to another execution context.
#[derive(Clone)]
pub struct Dispatcher(Arc<dyn Fn(Callback) + Send + Sync + 'static>);

impl Dispatcher {
    pub fn new<F>(dispatch: F) -> Self
    where
        F: Fn(Callback) + Send + Sync + 'static,
    {
        Self(Arc::new(dispatch))
    }

    pub fn dispatch(&self, callback: Callback) {
        (self.0)(callback);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher(..)")
    }
}

/// Execution context for a submission's callbacks.
#[derive(Debug, Clone, Default)]
pub enum Delivery {
    /// Run callbacks on the worker thread, right after the unit.
    #[default]
    Worker,
    /// Hand callbacks to a dispatcher.
    Dispatch(Dispatcher),
}

/// Callback inbox for a thread that owns its own loop.
///
/// The worker pushes callback batches; the owning thread drains them with
/// [`run_pending`](Self::run_pending) or [`run_next`](Self::run_next).
pub struct CallbackQueue {
    tx: flume::Sender<Callback>,
    rx: flume::Receiver<Callback>,
}

impl CallbackQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Returns a [`Delivery`] that routes callbacks into this queue.
    #[must_use]
    pub fn delivery(&self) -> Delivery {
        let tx = self.tx.clone();
        Delivery::Dispatch(Dispatcher::new(move |callback| {
            if tx.send(callback).is_err() {
                tracing::warn!("Callback queue closed; dropping callbacks");
            }
        }))
    }

    /// Number of callback batches waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Runs every batch already queued and returns how many ran.
    pub fn run_pending(&self) -> usize {
        self.rx.try_iter().map(|callback| callback()).count()
    }

    /// Waits up to `timeout` for one batch and runs it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(callback) => {
                callback();
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for CallbackQueue {
    fn default() -> Self {
        Self::new()
    }
}
