// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{GitQuery, GixBackend, ShellBackend};
use crate::error::GitError;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn shell() -> Option<ShellBackend> {
    ShellBackend::locate("git").ok()
}

#[test]
fn test_gix_backend_is_git_repo() {
    let temp = temp_dir();
    assert!(!GixBackend.is_git_repo(temp.path()));

    gix::init(temp.path()).expect("failed to init repo");
    assert!(GixBackend.is_git_repo(temp.path()));
}

#[test]
fn test_gix_has_stashed_changes_no_stash() {
    let temp = temp_dir();
    gix::init(temp.path()).expect("failed to init repo");

    let result = GixBackend.has_stashed_changes(temp.path());
    assert!(!result.expect("stash query should succeed"));
}

#[test]
fn test_gix_current_branch_outside_repo_fails() {
    let temp = temp_dir();
    assert!(GixBackend.current_branch(temp.path()).is_err());
}

#[test]
fn test_locate_missing_executable() {
    let err = ShellBackend::locate("gitsched-no-such-git").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::ExecutableNotFound)
    ));
}

#[test]
fn test_shell_command_failure_carries_stderr() {
    let Some(shell) = shell() else { return };
    let temp = temp_dir();

    let err = shell
        .git_command(&["rev-parse", "HEAD"], temp.path())
        .unwrap_err();
    match err.downcast_ref::<GitError>() {
        Some(GitError::CommandFailed { command, message }) => {
            assert_eq!(command, "git rev-parse HEAD");
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_backends_consistency() {
    let Some(shell) = shell() else { return };
    let temp = temp_dir();

    assert!(!GixBackend.is_git_repo(temp.path()));
    assert!(!shell.is_git_repo(temp.path()));

    shell
        .git_command(&["init", "--quiet"], temp.path())
        .expect("git init should succeed");
    assert!(GixBackend.is_git_repo(temp.path()));
    assert!(shell.is_git_repo(temp.path()));
    assert!(!shell.has_uncommitted_changes(temp.path()).unwrap());

    std::fs::write(temp.path().join("new.txt"), "x").unwrap();
    assert!(shell.has_uncommitted_changes(temp.path()).unwrap());
    assert!(GixBackend.has_uncommitted_changes(temp.path()).unwrap());
}
