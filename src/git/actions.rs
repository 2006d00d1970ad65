// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Call-site adapter: every git action on a repository goes through one
//! [`Scheduler`], so two actions never touch the repository at once.
//!
//! ```text
//! toolbar / menu / CLI
//!        |
//!        v
//! GitActions { scheduler, backend, repo, delivery }
//!   operation(op)                           -> Submission<String>
//!   run(op, on_done, on_error)              -> Handle
//!   run_with_output(op, on_result, on_error)-> Handle
//!   current_branch(on_result, on_error)     -> Handle
//!   status(on_result, on_error)             -> Handle
//!        |
//!        v
//! Scheduler worker: ShellBackend (git CLI) / gix queries
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::backend::ShellBackend;
use super::ops::GitOperation;
use super::query::{self, RepoStatus};
use crate::config::types::GitConfig;
use crate::error::{GitError, Result};
use crate::scheduler::{self, Delivery, DoneCallback, Handle, Scheduler, Submission};

/// Git actions bound to one repository and one scheduler.
#[derive(Debug, Clone)]
pub struct GitActions {
    scheduler: Scheduler,
    backend: Arc<ShellBackend>,
    repo: Arc<PathBuf>,
    delivery: Delivery,
}

impl GitActions {
    /// Binds `repo` to `scheduler` after checking it is a git work tree and
    /// that the configured git executable exists.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepoNotFound` or `GitError::ExecutableNotFound`.
    pub fn open(scheduler: &Scheduler, repo: &Path, git: &GitConfig) -> Result<Self> {
        if !query::is_git_repo(repo) {
            return Err(GitError::RepoNotFound {
                path: repo.display().to_string(),
            }
            .into());
        }
        let backend = ShellBackend::locate(&git.executable)?;
        debug!(repo = %repo.display(), "Opened repository");
        Ok(Self {
            scheduler: scheduler.clone(),
            backend: Arc::new(backend),
            repo: Arc::new(repo.to_path_buf()),
            delivery: Delivery::Worker,
        })
    }

    /// Routes callbacks through `delivery` instead of the worker thread.
    #[must_use]
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn command<T: Send + 'static>(
        &self,
        label: String,
        work: impl FnOnce(&ShellBackend, &Path) -> Result<T> + Send + 'static,
    ) -> Submission<T> {
        let backend = Arc::clone(&self.backend);
        let repo = Arc::clone(&self.repo);
        Submission::new(move || {
            scheduler::ensure_not_interrupted()?;
            work(backend.as_ref(), repo.as_path())
        })
        .with_label(label)
        .deliver_on(self.delivery.clone())
    }

    /// Builds the submission for `operation` without queuing it, so callers
    /// can add a delay or callbacks before handing it to the scheduler.
    /// The unit's value is git's trimmed stdout.
    #[must_use]
    pub fn operation(&self, operation: GitOperation) -> Submission<String> {
        let label = operation.to_string();
        self.command(label, move |backend, repo| backend.run(&operation, repo))
    }

    /// Runs `operation`; `on_done` (if any) runs afterwards, then `on_error`
    /// receives the failure, if there was one.
    pub fn run<E>(&self, operation: GitOperation, on_done: Option<DoneCallback>, on_error: E) -> Handle
    where
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.scheduler.submit(
            self.operation(operation)
                .on_done_boxed(on_done)
                .on_error(on_error),
        )
    }

    /// Runs `operation` and hands its trimmed stdout to `on_result`.
    pub fn run_with_output<R, E>(&self, operation: GitOperation, on_result: R, on_error: E) -> Handle
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.scheduler.submit(
            self.operation(operation)
                .on_result(on_result)
                .on_error(on_error),
        )
    }

    /// Reads the current branch on the worker, behind any queued mutation.
    pub fn current_branch<R, E>(&self, on_result: R, on_error: E) -> Handle
    where
        R: FnOnce(Option<String>) + Send + 'static,
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.scheduler.submit(
            self.command("current-branch".to_string(), |_, repo| {
                query::current_branch(repo)
            })
            .on_result(on_result)
            .on_error(on_error),
        )
    }

    /// Collects [`RepoStatus`] on the worker.
    pub fn status<R, E>(&self, on_result: R, on_error: E) -> Handle
    where
        R: FnOnce(RepoStatus) + Send + 'static,
        E: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.scheduler.submit(
            self.command("status".to_string(), |_, repo| query::status(repo))
                .on_result(on_result)
                .on_error(on_error),
        )
    }
}
