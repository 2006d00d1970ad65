// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Typed git operations submitted by call sites.
//!
//! ```text
//! GitOperation::Commit { message, all }   git commit [-a] -m <message>
//! GitOperation::Push { remote, branch }   git push [remote [branch]]
//! GitOperation::Pull { remote, branch }   git pull [remote [branch]]
//! GitOperation::Fetch { remote }          git fetch (<remote> | --all)
//! GitOperation::Merge { branch }          git merge <branch>
//! GitOperation::Revert { commit }         git revert --no-edit <commit>
//! GitOperation::StashPush { message }     git stash push [-m <message>]
//! GitOperation::StashPop                  git stash pop
//! GitOperation::Tag { name, message }     git tag [-a -m <message>] <name>
//! GitOperation::CreateBranch { .. }       git branch <name> | git checkout -b <name>
//! GitOperation::Checkout { target }       git checkout <target>
//! GitOperation::Raw(args)                 git <args...>
//! ```

use std::fmt;

use crate::error::{GitError, Result};

/// One git invocation, expressed by intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOperation {
    Commit { message: String, all: bool },
    Push {
        remote: Option<String>,
        branch: Option<String>,
    },
    Pull {
        remote: Option<String>,
        branch: Option<String>,
    },
    /// Fetches one remote, or all remotes when `remote` is `None`.
    Fetch { remote: Option<String> },
    Merge { branch: String },
    Revert { commit: String },
    StashPush { message: Option<String> },
    StashPop,
    /// Lightweight tag without a message, annotated tag otherwise.
    Tag {
        name: String,
        message: Option<String>,
    },
    CreateBranch { name: String, checkout: bool },
    Checkout { target: String },
    /// Arbitrary arguments passed straight to git.
    Raw(Vec<String>),
}

impl GitOperation {
    /// Parses a whitespace-separated argument list, as given on the command
    /// line, into a raw operation.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` for an empty step.
    pub fn parse_step(step: &str) -> Result<Self> {
        let args: Vec<String> = step.split_whitespace().map(str::to_string).collect();
        if args.is_empty() {
            return Err(GitError::CommandFailed {
                command: "git".to_string(),
                message: "empty step".to_string(),
            }
            .into());
        }
        Ok(Self::Raw(args))
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Commit { .. } => "commit",
            Self::Push { .. } => "push",
            Self::Pull { .. } => "pull",
            Self::Fetch { .. } => "fetch",
            Self::Merge { .. } => "merge",
            Self::Revert { .. } => "revert",
            Self::StashPush { .. } => "stash-push",
            Self::StashPop => "stash-pop",
            Self::Tag { .. } => "tag",
            Self::CreateBranch { .. } => "create-branch",
            Self::Checkout { .. } => "checkout",
            Self::Raw(_) => "raw",
        }
    }

    /// Arguments passed to the git executable.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |arg: &str| args.push(arg.to_string());
        match self {
            Self::Commit { message, all } => {
                push("commit");
                if *all {
                    push("-a");
                }
                push("-m");
                push(message);
            }
            Self::Push { remote, branch } | Self::Pull { remote, branch } => {
                push(self.name());
                if let Some(remote) = remote {
                    push(remote);
                    if let Some(branch) = branch {
                        push(branch);
                    }
                }
            }
            Self::Fetch { remote } => {
                push("fetch");
                push(remote.as_deref().unwrap_or("--all"));
            }
            Self::Merge { branch } => {
                push("merge");
                push(branch);
            }
            Self::Revert { commit } => {
                push("revert");
                push("--no-edit");
                push(commit);
            }
            Self::StashPush { message } => {
                push("stash");
                push("push");
                if let Some(message) = message {
                    push("-m");
                    push(message);
                }
            }
            Self::StashPop => {
                push("stash");
                push("pop");
            }
            Self::Tag { name, message } => {
                push("tag");
                if let Some(message) = message {
                    push("-a");
                    push("-m");
                    push(message);
                }
                push(name);
            }
            Self::CreateBranch { name, checkout } => {
                if *checkout {
                    push("checkout");
                    push("-b");
                } else {
                    push("branch");
                }
                push(name);
            }
            Self::Checkout { target } => {
                push("checkout");
                push(target);
            }
            Self::Raw(raw) => raw.iter().for_each(|arg| push(arg)),
        }
        args
    }
}

impl fmt::Display for GitOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", self.args().join(" "))
    }
}
