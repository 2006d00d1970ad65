// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::config::types::GitConfig;
use crate::error::GitError;
use crate::git::{GitActions, GitOperation};
use crate::scheduler::Scheduler;
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

#[test]
fn test_operation_command_lines() {
    let operations = [
        GitOperation::Commit {
            message: "Fix build".into(),
            all: true,
        },
        GitOperation::Push {
            remote: Some("origin".into()),
            branch: Some("main".into()),
        },
        GitOperation::Pull {
            remote: None,
            branch: Some("ignored-without-remote".into()),
        },
        GitOperation::Fetch { remote: None },
        GitOperation::Merge {
            branch: "feature".into(),
        },
        GitOperation::Revert {
            commit: "abc123".into(),
        },
        GitOperation::StashPush {
            message: Some("wip".into()),
        },
        GitOperation::StashPop,
        GitOperation::Tag {
            name: "v1.0".into(),
            message: Some("Release".into()),
        },
        GitOperation::CreateBranch {
            name: "topic".into(),
            checkout: true,
        },
        GitOperation::Checkout {
            target: "main".into(),
        },
        GitOperation::Raw(vec!["log".into(), "-1".into()]),
    ];

    let rendered: Vec<String> = operations
        .iter()
        .map(|op| format!("{:<13} {op}", op.name()))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    commit        git commit -a -m Fix build
    push          git push origin main
    pull          git pull
    fetch         git fetch --all
    merge         git merge feature
    revert        git revert --no-edit abc123
    stash-push    git stash push -m wip
    stash-pop     git stash pop
    tag           git tag -a -m Release v1.0
    create-branch git checkout -b topic
    checkout      git checkout main
    raw           git log -1
    ");
}

#[test]
fn test_commit_message_is_one_argument() {
    let op = GitOperation::Commit {
        message: "two words".into(),
        all: false,
    };
    assert_eq!(op.args(), vec!["commit", "-m", "two words"]);
}

#[test]
fn test_create_branch_without_checkout() {
    let op = GitOperation::CreateBranch {
        name: "topic".into(),
        checkout: false,
    };
    assert_eq!(op.args(), vec!["branch", "topic"]);
}

#[test]
fn test_parse_step() {
    let op = GitOperation::parse_step("  fetch   origin ").expect("step should parse");
    assert_eq!(
        op,
        GitOperation::Raw(vec!["fetch".into(), "origin".into()])
    );
    assert!(GitOperation::parse_step("   ").is_err());
}

#[test]
fn test_open_rejects_non_repository() {
    let temp = temp_dir();
    let scheduler = Scheduler::new();

    let err = GitActions::open(&scheduler, temp.path(), &GitConfig::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::RepoNotFound { .. })
    ));
}

#[test]
fn test_open_rejects_missing_executable() {
    let temp = temp_dir();
    gix::init(temp.path()).expect("failed to init repo");
    let git = GitConfig {
        executable: PathBuf::from("gitsched-no-such-git"),
        repo: None,
    };

    let err = GitActions::open(&Scheduler::new(), temp.path(), &git).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GitError>(),
        Some(GitError::ExecutableNotFound)
    ));
}
