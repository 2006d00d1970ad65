// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `run` command: schedules git steps in order and waits for them.
//!
//! ```text
//! steps --> GitOperation::parse_step --> GitActions::operation
//!   --> Scheduler worker (one at a time)
//!   --> on_result prints stdout, on_error prints failure
//!         first failure cancels later steps unless --keep-going
//!   --> wait (Ctrl+C: shutdown_now) --> shutdown hook --> summary
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::git::{RepoArgs, RunArgs};
use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::git::{GitActions, GitOperation};
use crate::scheduler::{Handle, Outcome, Scheduler, ShutdownStatus};

/// Handles submitted so far and whether a failure stopped the run.
#[derive(Default)]
struct Batch {
    stopped: bool,
    handles: Vec<Handle>,
}

/// Tally of step outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Completed => self.completed += 1,
            Outcome::Failed { .. } | Outcome::Interrupted => self.failed += 1,
            Outcome::Cancelled(_) => self.cancelled += 1,
        }
    }

    #[must_use]
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Picks the repository: `--repo`, then `git.repo`, then the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read.
pub fn resolve_repo(args: &RepoArgs, config: &Config) -> Result<PathBuf> {
    if let Some(repo) = args.repo.as_ref().or(config.git.repo.as_ref()) {
        return Ok(repo.clone());
    }
    std::env::current_dir().context("Failed to read current directory")
}

/// Run the run command.
///
/// # Errors
///
/// Returns an error if a step cannot be parsed, the repository cannot be
/// opened, or any step did not complete.
pub async fn run_steps_command(
    args: &RunArgs,
    config: &Config,
    interrupt: &CancellationToken,
) -> Result<()> {
    let operations = args
        .steps
        .iter()
        .map(|step| GitOperation::parse_step(step))
        .collect::<Result<Vec<_>>>()?;

    let repo = resolve_repo(&args.repo, config)?;
    let scheduler = Scheduler::with_config(&config.scheduler);
    let actions = GitActions::open(&scheduler, &repo, &config.git)?;

    info!(repo = %repo.display(), steps = operations.len(), "Scheduling git steps");
    let batch = submit_steps(&actions, operations, Duration::from_millis(args.delay_ms), args.keep_going);
    let handles = batch
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .handles
        .clone();

    let outcomes = wait_for_steps(&scheduler, handles, interrupt).await?;
    let summary = RunSummary::from_outcomes(&outcomes);

    println!(
        "{} completed, {} failed, {} cancelled",
        summary.completed, summary.failed, summary.cancelled
    );

    let timeout = scheduler.shutdown_timeout();
    match scheduler.shutdown_until_cancelled(timeout, interrupt).await {
        ShutdownStatus::Quiesced => {}
        ShutdownStatus::TimedOut => {
            return Err(TaskError::ShutdownTimedOut {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into());
        }
        ShutdownStatus::Interrupted => {
            let _ = scheduler.shutdown_now(timeout);
        }
    }

    if !summary.is_success() {
        bail!("{} of {} steps did not complete", outcomes.len() - summary.completed, outcomes.len());
    }
    Ok(())
}

fn submit_steps(
    actions: &GitActions,
    operations: Vec<GitOperation>,
    delay: Duration,
    keep_going: bool,
) -> Arc<Mutex<Batch>> {
    let batch = Arc::new(Mutex::new(Batch::default()));

    for operation in operations {
        let label = operation.to_string();
        let on_error_label = label.clone();
        let on_error_batch = Arc::clone(&batch);

        let submission = actions
            .operation(operation)
            .with_delay(delay)
            .on_result(move |output: String| {
                println!("$ {label}");
                if !output.is_empty() {
                    println!("{output}");
                }
            })
            .on_error(move |err| {
                if TaskError::is_cancellation(&err) {
                    println!("$ {on_error_label} (skipped)");
                    return;
                }
                eprintln!("$ {on_error_label} failed: {err:#}");
                if keep_going {
                    return;
                }
                let mut batch = on_error_batch.lock().unwrap_or_else(PoisonError::into_inner);
                batch.stopped = true;
                for handle in &batch.handles {
                    handle.cancel();
                }
            });

        let handle = actions.scheduler().submit(submission);
        let mut batch_guard = batch.lock().unwrap_or_else(PoisonError::into_inner);
        if batch_guard.stopped {
            handle.cancel();
        }
        batch_guard.handles.push(handle);
    }

    batch
}

async fn wait_for_steps(
    scheduler: &Scheduler,
    handles: Vec<Handle>,
    interrupt: &CancellationToken,
) -> Result<Vec<Outcome>> {
    let waiter = tokio::task::spawn_blocking(move || {
        handles.iter().map(Handle::wait).collect::<Vec<_>>()
    });

    tokio::select! {
        biased;
        () = interrupt.cancelled() => {
            warn!("Interrupted; abandoning queued git steps");
            let scheduler = scheduler.clone();
            tokio::task::spawn_blocking(move || scheduler.shutdown_now(scheduler.shutdown_timeout()))
                .await
                .context("Shutdown task failed")?;
            bail!("Interrupted");
        }
        outcomes = waiter => outcomes.context("Step waiter failed"),
    }
}
