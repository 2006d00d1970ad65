// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git query operations using gix backend.
//!
//! ```text
//! query.rs --> GixBackend --> .git/ (no subprocess)
//! ```

use crate::error::Result;
use serde::Serialize;
use std::path::Path;

use super::backend::{GitQuery, GixBackend};

/// Snapshot of repository state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    /// Current branch, `None` when HEAD is detached.
    pub branch: Option<String>,
    /// Staged, unstaged or untracked changes exist.
    pub dirty: bool,
    /// `refs/stash` exists.
    pub stashed: bool,
}

#[must_use]
pub fn is_git_repo(path: &Path) -> bool {
    GixBackend.is_git_repo(path)
}

/// Get current branch name (None if HEAD is detached).
///
/// # Errors
///
/// Returns a `GitError` if repository discovery or head resolution fails.
pub fn current_branch(path: &Path) -> Result<Option<String>> {
    GixBackend.current_branch(path)
}

/// Collects branch, working tree and stash state in one pass.
///
/// # Errors
///
/// Returns a `GitError` if any of the underlying queries fails.
pub fn status(path: &Path) -> Result<RepoStatus> {
    Ok(RepoStatus {
        branch: GixBackend.current_branch(path)?,
        dirty: GixBackend.has_uncommitted_changes(path)?,
        stashed: GixBackend.has_stashed_changes(path)?,
    })
}
