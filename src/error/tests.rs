// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ConfigError, GitError, TaskError};
use crate::scheduler::{CancelReason, TaskId};

#[test]
fn test_config_error_display() {
    let err = ConfigError::MissingKey {
        section: "scheduler".to_string(),
        key: "worker_name".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"missing required config key 'worker_name' in section '[scheduler]'"
    );
}

#[test]
fn test_task_error_display() {
    let cancelled = TaskError::Cancelled {
        id: TaskId::new(7),
        reason: CancelReason::Shutdown,
    };
    insta::assert_snapshot!(cancelled.to_string(), @"task #7 was cancelled (scheduler shut down)");

    let wrapped = anyhow::Error::new(TaskError::Interrupted { id: TaskId::new(3) })
        .context("git fetch --all");
    insta::assert_snapshot!(format!("{wrapped:#}"), @"git fetch --all: task #3 was interrupted");
    assert!(TaskError::is_interruption(&wrapped));
}

#[test]
fn test_cancellation_is_distinguished_from_failure() {
    let cancelled = anyhow::Error::new(TaskError::Cancelled {
        id: TaskId::new(1),
        reason: CancelReason::Withdrawn,
    });
    let failed = anyhow::anyhow!("push rejected");
    let panicked = anyhow::Error::new(TaskError::Panicked {
        id: TaskId::new(2),
        message: "boom".to_string(),
    });

    assert!(TaskError::is_cancellation(&cancelled));
    assert!(!TaskError::is_cancellation(&failed));
    assert!(!TaskError::is_cancellation(&panicked));
    assert!(!TaskError::is_interruption(&cancelled));
}

#[test]
fn test_git_error_display() {
    let err = GitError::CommandFailed {
        command: "git checkout topic".to_string(),
        message: "pathspec 'topic' did not match".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"git command failed: git checkout topic - pathspec 'topic' did not match"
    );
}
