// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments for the repository commands.
//!
//! ```text
//! run -C DIR --delay-ms 500 "fetch --all" "pull"
//!   -> each STEP scheduled in order after the delay
//! branch -C DIR
//!   -> current branch (detached HEAD prints nothing)
//! status -C DIR --json
//!   -> branch, dirty, stashed
//! ```

use clap::Args;
use std::path::PathBuf;

/// Repository selection shared by every repository command.
#[derive(Debug, Clone, Default, Args)]
pub struct RepoArgs {
    /// Repository to operate on. Defaults to `git.repo`, then the current directory.
    #[arg(short = 'C', long = "repo", value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Holds the steps back by this many milliseconds; their order is kept.
    #[arg(long = "delay-ms", value_name = "MS", default_value_t = 0)]
    pub delay_ms: u64,

    /// Keeps running the remaining steps after one fails.
    #[arg(short = 'k', long = "keep-going")]
    pub keep_going: bool,

    /// Git argument lists, one per step. Each is split on whitespace, e.g. "fetch --all".
    #[arg(value_name = "STEP", required = true, num_args = 1..)]
    pub steps: Vec<String>,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Prints the status as JSON.
    #[arg(long)]
    pub json: bool,
}
