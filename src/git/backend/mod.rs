// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! GitQuery (read)     --> GixBackend (pure Rust gix, no subprocess)
//!                     --> ShellBackend (git CLI)
//! git_command (write) --> ShellBackend
//!                           spawn git, read stdout/stderr on helper threads
//!                           poll child + worker interrupt token
//!                           cancelled -> kill child -> TaskError::Interrupted
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::ops::GitOperation;
use crate::error::{GitError, GixError, Result};
use crate::scheduler;

/// How often a running git process is checked for exit or interruption.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Read-only git query operations.
pub trait GitQuery {
    /// Check if path is inside a git work tree.
    fn is_git_repo(&self, path: &Path) -> bool;

    /// Get current branch name (None if HEAD is detached or unborn without a name).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or head resolution fails.
    fn current_branch(&self, path: &Path) -> Result<Option<String>>;

    /// Check for uncommitted changes (staged, unstaged, or untracked files).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or status check fails.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool>;

    /// Check for stashed changes.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or reference lookup fails.
    fn has_stashed_changes(&self, path: &Path) -> Result<bool>;
}

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix.
#[derive(Debug, Clone, Copy, Default)]
pub struct GixBackend;

impl GixBackend {
    fn discover(path: &Path) -> Result<gix::Repository> {
        Ok(gix::discover(path).map_err(|e| GitError::Gix(GixError::Discover(Box::new(e))))?)
    }
}

impl GitQuery for GixBackend {
    fn is_git_repo(&self, path: &Path) -> bool {
        gix::discover(path).is_ok()
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        let repo = Self::discover(path)?;
        let head = repo
            .head_name()
            .map_err(|e| GitError::Gix(GixError::Head(e)))?;
        Ok(head.map(|name| name.shorten().to_string()))
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool> {
        use gix::status::UntrackedFiles;

        let repo = Self::discover(path)?;
        let has_changes = repo
            .status(gix::progress::Discard)
            .map_err(|_| GitError::CommandFailed {
                command: "status".to_string(),
                message: "failed to prepare status check".to_string(),
            })?
            .untracked_files(UntrackedFiles::Files)
            .into_iter(None)
            .map_err(|_| GitError::CommandFailed {
                command: "status".to_string(),
                message: "failed to check repository status".to_string(),
            })?
            .next()
            .is_some();

        Ok(has_changes)
    }

    fn has_stashed_changes(&self, path: &Path) -> Result<bool> {
        let repo = Self::discover(path)?;

        // refs/stash exists iff there are stashed changes
        match repo.find_reference("refs/stash") {
            Ok(_) => Ok(true),
            Err(gix::reference::find::existing::Error::NotFound { name: _ }) => Ok(false),
            Err(e) => Err(GitError::Gix(GixError::Head(e)).into()),
        }
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Git CLI backend used for every mutating operation.
#[derive(Debug, Clone)]
pub struct ShellBackend {
    executable: PathBuf,
}

impl Default for ShellBackend {
    fn default() -> Self {
        Self::new("git")
    }
}

impl ShellBackend {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Resolves the executable through `PATH` and returns a backend bound
    /// to the absolute path.
    ///
    /// # Errors
    ///
    /// Returns `GitError::ExecutableNotFound` if no such executable exists.
    pub fn locate(executable: impl AsRef<Path>) -> Result<Self> {
        let resolved =
            which::which(executable.as_ref()).map_err(|_| GitError::ExecutableNotFound)?;
        debug!(git = %resolved.display(), "Using git executable");
        Ok(Self::new(resolved))
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs an operation in `cwd` and returns its trimmed stdout.
    ///
    /// # Errors
    ///
    /// See [`git_command`](Self::git_command).
    pub fn run(&self, operation: &GitOperation, cwd: &Path) -> Result<String> {
        let args = operation.args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.git_command(&args, cwd)
    }

    /// Execute a git command. Sets `GCM_INTERACTIVE=never` and `GIT_TERMINAL_PROMPT=0`.
    ///
    /// On a worker thread, the process is killed when the worker is
    /// interrupted and the call fails with `TaskError::Interrupted`.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be spawned, exits unsuccessfully
    /// (`GitError::CommandFailed` carrying stderr), or is interrupted.
    pub fn git_command(&self, args: &[&str], cwd: &Path) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        debug!(cwd = %cwd.display(), cmd = %command, "exec");

        let mut child = Command::new(&self.executable)
            .args(args)
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| std::io::Error::new(e.kind(), format!("failed to execute git: {e}")))?;
        trace!(pid = child.id(), "spawned");

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let (status, stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(move || read_stream(stdout.as_mut()));
            let err = scope.spawn(move || read_stream(stderr.as_mut()));
            let status = wait_interruptible(&mut child, &command);
            (
                status,
                out.join().unwrap_or_default(),
                err.join().unwrap_or_default(),
            )
        });
        let status = status?;

        if !status.success() {
            return Err(GitError::CommandFailed {
                command,
                message: String::from_utf8_lossy(&stderr).trim().to_string(),
            }
            .into());
        }
        trace!(cmd = %command, "completed");
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

fn read_stream(stream: Option<&mut impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(stream) = stream
        && let Err(e) = stream.read_to_end(&mut buf)
    {
        warn!(error = %e, "failed to read git output");
    }
    buf
}

fn wait_interruptible(child: &mut Child, command: &str) -> Result<ExitStatus> {
    let token = scheduler::interrupt_token();
    loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed waiting for {command}"))?
        {
            return Ok(status);
        }
        if token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            warn!(cmd = %command, "Interrupted, terminating git");
            let _ = child.kill();
            let _ = child.wait();
            scheduler::ensure_not_interrupted()?;
            anyhow::bail!("{command} was interrupted");
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl GitQuery for ShellBackend {
    fn is_git_repo(&self, path: &Path) -> bool {
        self.git_command(&["rev-parse", "--is-inside-work-tree"], path)
            .is_ok()
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        self.git_command(&["symbolic-ref", "--short", "-q", "HEAD"], path)
            .map_or_else(|_| Ok(None), |branch| Ok(Some(branch)))
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool> {
        let output = self.git_command(&["status", "--porcelain"], path)?;
        Ok(!output.is_empty())
    }

    fn has_stashed_changes(&self, path: &Path) -> Result<bool> {
        let output = self.git_command(&["stash", "list"], path);
        output.map_or_else(|_| Ok(false), |list| Ok(!list.is_empty()))
    }
}

#[cfg(test)]
mod tests;
