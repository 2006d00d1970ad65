// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!   GitError     Gix, CommandFailed, RepoNotFound, ExecutableNotFound
//!   ConfigError  ParseError, MissingKey, InvalidValue
//!   TaskError    Cancelled, Panicked, Interrupted, WorkerSpawn, ShutdownTimedOut
//!          \           |            /
//!           +---- anyhow::Error ----+
//! ```
//!
//! Units of work and callbacks speak `anyhow::Error`. Errors the scheduler
//! itself produces are [`TaskError`] values inside that `anyhow::Error`, so
//! callers can tell a cancellation from a genuine failure with
//! [`TaskError::is_cancellation`].

use thiserror::Error;

use crate::scheduler::{CancelReason, TaskId};

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),
}

// --- Git Errors ---

/// Git operation errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found at the specified path.
    #[error("repository not found: {path}")]
    RepoNotFound { path: String },

    /// The `git` executable could not be located.
    #[error("git executable not found in PATH")]
    ExecutableNotFound,

    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Task Errors ---

/// Errors produced by the scheduler about a unit of work.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The unit never ran, or its result was withdrawn.
    #[error("task {id} was cancelled ({reason})")]
    Cancelled { id: TaskId, reason: CancelReason },

    /// The unit panicked while running.
    #[error("task {id} panicked: {message}")]
    Panicked { id: TaskId, message: String },

    /// The worker was interrupted while the unit ran.
    #[error("task {id} was interrupted")]
    Interrupted { id: TaskId },

    /// No worker thread could be started for the unit.
    #[error("failed to spawn worker thread")]
    WorkerSpawn(#[source] std::io::Error),

    /// The worker did not quiesce in time.
    #[error("worker did not stop within {timeout_ms} ms")]
    ShutdownTimedOut { timeout_ms: u64 },
}

impl TaskError {
    /// Returns `true` if `err` is a scheduler cancellation rather than a failure.
    #[must_use]
    pub fn is_cancellation(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Self>(), Some(Self::Cancelled { .. }))
    }

    /// Returns `true` if `err` reports an interrupted unit.
    #[must_use]
    pub fn is_interruption(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Self>(), Some(Self::Interrupted { .. }))
    }
}

#[cfg(test)]
mod tests;
