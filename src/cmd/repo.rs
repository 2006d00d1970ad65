// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Read-only repository commands.
//!
//! Queries run on the scheduler worker like any other git action; their
//! callbacks come back through a [`CallbackQueue`] pumped by this thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use tracing::warn;

use crate::cli::git::{RepoArgs, StatusArgs};
use crate::cmd::run::resolve_repo;
use crate::config::Config;
use crate::error::Result;
use crate::git::{GitActions, RepoStatus};
use crate::scheduler::{CallbackQueue, Handle, Scheduler};

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Runs callbacks from `queue` on this thread until `handle` is done and
/// nothing is left to deliver.
fn pump_until_done(queue: &CallbackQueue, handle: &Handle) {
    while !handle.is_done() || !queue.is_empty() {
        queue.run_next(PUMP_INTERVAL);
    }
}

/// Stops the query worker with the configured timeout. Returns whether it
/// quiesced in time.
pub(crate) fn stop_scheduler(scheduler: &Scheduler) -> bool {
    let quiesced = scheduler.shutdown_default();
    if !quiesced {
        warn!(
            timeout_ms = scheduler.shutdown_timeout().as_millis(),
            "Query worker did not stop in time"
        );
    }
    quiesced
}

/// Submits one query through `submit` and returns its delivered value.
fn query<T, S>(args: &RepoArgs, config: &Config, submit: S) -> Result<T>
where
    T: Send + 'static,
    S: FnOnce(&GitActions, Arc<Mutex<Option<Result<T>>>>) -> Handle,
{
    let repo = resolve_repo(args, config)?;
    let scheduler = Scheduler::with_config(&config.scheduler);
    let queue = CallbackQueue::new();
    let actions = GitActions::open(&scheduler, &repo, &config.git)?.with_delivery(queue.delivery());

    let slot = Arc::new(Mutex::new(None));
    let handle = submit(&actions, Arc::clone(&slot));
    pump_until_done(&queue, &handle);
    stop_scheduler(&scheduler);

    let delivered = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    delivered.unwrap_or_else(|| Err(anyhow!("{} finished without a result", handle.id())))
}

/// Run the branch command.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened or HEAD cannot be read.
pub fn run_branch_command(args: &RepoArgs, config: &Config) -> Result<()> {
    let branch: Option<String> = query(args, config, |actions, slot| {
        let on_error_slot = Arc::clone(&slot);
        actions.current_branch(
            move |branch| *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(branch)),
            move |err| *on_error_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Err(err)),
        )
    })?;

    if let Some(branch) = branch {
        println!("{branch}");
    }
    Ok(())
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened or queried.
pub fn run_status_command(args: &StatusArgs, config: &Config) -> Result<()> {
    let status: RepoStatus = query(&args.repo, config, |actions, slot| {
        let on_error_slot = Arc::clone(&slot);
        actions.status(
            move |status| *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(status)),
            move |err| *on_error_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Err(err)),
        )
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for line in format_status(&status) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Renders a status as `key: value` lines.
#[must_use]
pub fn format_status(status: &RepoStatus) -> Vec<String> {
    vec![
        format!("branch:  {}", status.branch.as_deref().unwrap_or("(detached)")),
        format!("dirty:   {}", status.dirty),
        format!("stashed: {}", status.stashed),
    ]
}
