// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for git call sites.
//!
//! Runs real git operations through a scheduler against temporary
//! repositories. Tests return early when no `git` executable is on `PATH`.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use gitsched::config::types::GitConfig;
use gitsched::error::GitError;
use gitsched::git::query::{current_branch, is_git_repo};
use gitsched::git::{GitActions, GitOperation, RepoStatus};
use gitsched::scheduler::{CallbackQueue, Outcome, Scheduler};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Helper to run git commands in a directory
fn run_git(args: &[&str], cwd: &Path) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create an initialized git repo on branch `main`
fn init_test_repo(dir: &Path) {
    assert!(run_git(&["init", "-q"], dir));
    run_git(&["symbolic-ref", "HEAD", "refs/heads/main"], dir);
    run_git(&["config", "user.email", "test@test.com"], dir);
    run_git(&["config", "user.name", "Test"], dir);
    run_git(&["config", "commit.gpgsign", "false"], dir);
}

/// Create an initialized git repo with an initial commit (README.md)
fn init_test_repo_with_commit(dir: &Path) {
    init_test_repo(dir);
    fs::write(dir.join("README.md"), "# Test").unwrap();
    run_git(&["add", "."], dir);
    run_git(&["commit", "-q", "-m", "Initial commit"], dir);
}

fn open(scheduler: &Scheduler, dir: &Path) -> GitActions {
    GitActions::open(scheduler, dir, &GitConfig::default()).expect("repository should open")
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn git_is_git_repo_subdirectory() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    assert!(!is_git_repo(temp.path()));

    init_test_repo(temp.path());
    let subdir = temp.path().join("subdir");
    fs::create_dir(&subdir).unwrap();
    assert!(is_git_repo(&subdir));
}

#[test]
fn git_current_branch_detached_is_none() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());
    assert_eq!(current_branch(temp.path()).unwrap().as_deref(), Some("main"));

    assert!(run_git(&["checkout", "-q", "--detach"], temp.path()));
    assert_eq!(current_branch(temp.path()).unwrap(), None);
}

// =============================================================================
// Scheduled actions
// =============================================================================

#[test]
fn git_actions_run_in_submission_order() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());
    fs::write(temp.path().join("notes.txt"), "scheduled").unwrap();

    let scheduler = Scheduler::new();
    let actions = open(&scheduler, temp.path());
    let (tx, rx) = flume::unbounded();

    let handles = [
        actions.run(
            GitOperation::Raw(vec!["add".into(), "notes.txt".into()]),
            None,
            |err| panic!("add failed: {err:#}"),
        ),
        actions.run(
            GitOperation::Commit {
                message: "Add notes".into(),
                all: false,
            },
            None,
            |err| panic!("commit failed: {err:#}"),
        ),
        actions.run(
            GitOperation::CreateBranch {
                name: "topic".into(),
                checkout: true,
            },
            None,
            |err| panic!("branch failed: {err:#}"),
        ),
        actions.current_branch(
            move |branch| {
                let _ = tx.send(branch);
            },
            |err| panic!("query failed: {err:#}"),
        ),
    ];

    for handle in &handles {
        assert_eq!(handle.wait_timeout(WAIT), Some(Outcome::Completed));
    }
    assert_eq!(rx.try_recv().unwrap().as_deref(), Some("topic"));

    let log = actions
        .run_with_output(
            GitOperation::Raw(vec!["log".into(), "-1".into(), "--format=%s".into()]),
            |_| {},
            |_| {},
        )
        .wait_timeout(WAIT);
    assert_eq!(log, Some(Outcome::Completed));
    assert!(scheduler.shutdown(WAIT));
}

#[test]
fn git_actions_output_reaches_result_callback() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());

    let scheduler = Scheduler::new();
    let actions = open(&scheduler, temp.path());
    let (tx, rx) = flume::bounded(1);

    let handle = actions.run_with_output(
        GitOperation::Raw(vec!["log".into(), "-1".into(), "--format=%s".into()]),
        move |output| {
            let _ = tx.send(output);
        },
        |err| panic!("log failed: {err:#}"),
    );

    assert_eq!(handle.wait_timeout(WAIT), Some(Outcome::Completed));
    assert_eq!(rx.try_recv().unwrap(), "Initial commit");
}

#[test]
fn git_actions_failure_carries_command_and_stderr() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());

    let scheduler = Scheduler::new();
    let actions = open(&scheduler, temp.path());
    let (tx, rx) = flume::bounded(1);

    let handle = actions.run(
        GitOperation::Checkout {
            target: "no-such-branch".into(),
        },
        None,
        move |err| {
            let _ = tx.send(err);
        },
    );

    assert!(matches!(handle.wait_timeout(WAIT), Some(Outcome::Failed { .. })));
    let err = rx.try_recv().unwrap();
    match err.downcast_ref::<GitError>() {
        Some(GitError::CommandFailed { command, message }) => {
            assert_eq!(command, "git checkout no-such-branch");
            assert!(message.contains("no-such-branch"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn git_actions_status_through_callback_queue() {
    if !git_available() {
        return;
    }
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());
    fs::write(temp.path().join("README.md"), "# Changed").unwrap();

    let scheduler = Scheduler::new();
    let queue = CallbackQueue::new();
    let actions = open(&scheduler, temp.path()).with_delivery(queue.delivery());
    let (tx, rx) = flume::unbounded();

    let before = {
        let tx = tx.clone();
        actions.status(
            move |status| {
                let _ = tx.send(status);
            },
            |err| panic!("status failed: {err:#}"),
        )
    };
    let stash = actions.run(
        GitOperation::StashPush { message: None },
        None,
        |err| panic!("stash failed: {err:#}"),
    );
    let after = actions.status(
        move |status| {
            let _ = tx.send(status);
        },
        |err| panic!("status failed: {err:#}"),
    );

    for handle in [&before, &stash, &after] {
        assert_eq!(handle.wait_timeout(WAIT), Some(Outcome::Completed));
    }
    // Nothing is delivered until this thread pumps the queue.
    assert!(rx.is_empty());
    queue.run_pending();

    let statuses: Vec<RepoStatus> = rx.try_iter().collect();
    insta::assert_debug_snapshot!(statuses, @r#"
    [
        RepoStatus {
            branch: Some(
                "main",
            ),
            dirty: true,
            stashed: false,
        },
        RepoStatus {
            branch: Some(
                "main",
            ),
            dirty: false,
            stashed: true,
        },
    ]
    "#);
}

#[test]
fn git_actions_open_rejects_plain_directory() {
    let temp = temp_dir();
    let err = GitActions::open(&Scheduler::new(), temp.path(), &GitConfig::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::RepoNotFound { .. })
    ));
}
