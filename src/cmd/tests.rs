// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::git::RepoArgs;
use crate::cmd::repo::{format_status, stop_scheduler};
use crate::cmd::run::{RunSummary, resolve_repo};
use crate::config::Config;
use crate::config::types::SchedulerConfig;
use crate::git::RepoStatus;
use crate::scheduler::{CancelReason, Outcome, Scheduler};

#[test]
fn test_resolve_repo_prefers_flag() {
    let mut config = Config::default();
    config.git.repo = Some(PathBuf::from("/from/config"));
    let args = RepoArgs {
        repo: Some(PathBuf::from("/from/flag")),
    };

    assert_eq!(resolve_repo(&args, &config).unwrap(), PathBuf::from("/from/flag"));
    assert_eq!(
        resolve_repo(&RepoArgs::default(), &config).unwrap(),
        PathBuf::from("/from/config")
    );
}

#[test]
fn test_resolve_repo_falls_back_to_cwd() {
    let resolved = resolve_repo(&RepoArgs::default(), &Config::default()).unwrap();
    assert_eq!(resolved, std::env::current_dir().unwrap());
}

#[test]
fn test_run_summary() {
    let outcomes = [
        Outcome::Completed,
        Outcome::Failed {
            message: "exit 1".into(),
        },
        Outcome::Interrupted,
        Outcome::Cancelled(CancelReason::Withdrawn),
        Outcome::Completed,
    ];
    let summary = RunSummary::from_outcomes(&outcomes);
    insta::assert_debug_snapshot!(summary, @r"
    RunSummary {
        completed: 2,
        failed: 2,
        cancelled: 1,
    }
    ");
    assert!(!summary.is_success());
    assert!(RunSummary::from_outcomes(&[Outcome::Completed]).is_success());
}

#[test]
fn test_format_status() {
    let status = RepoStatus {
        branch: None,
        dirty: true,
        stashed: false,
    };
    insta::assert_snapshot!(format_status(&status).join("\n"), @r"
    branch:  (detached)
    dirty:   true
    stashed: false
    ");
}

#[test]
fn test_stop_scheduler_reports_quiescence() {
    let scheduler = Scheduler::with_config(&SchedulerConfig {
        shutdown_timeout_ms: 20,
        ..SchedulerConfig::default()
    });
    assert!(stop_scheduler(&scheduler));

    let (release_tx, release_rx) = flume::bounded::<()>(1);
    let (started_tx, started_rx) = flume::bounded::<()>(1);
    let busy = scheduler.schedule_now(move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv();
        Ok(())
    });
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!stop_scheduler(&scheduler));

    release_tx.send(()).unwrap();
    assert_eq!(busy.wait(), Outcome::Completed);
    assert!(scheduler.shutdown(Duration::from_secs(5)));
}
