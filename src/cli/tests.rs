// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cli::global::GlobalOptions;
use crate::cli::{Cli, Command};
use clap::Parser;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["gitsched", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_run() {
    let cli = Cli::try_parse_from([
        "gitsched",
        "-l",
        "4",
        "run",
        "-C",
        "/tmp/repo",
        "--delay-ms",
        "250",
        "--keep-going",
        "fetch --all",
        "status --short",
    ])
    .unwrap();
    insta::assert_debug_snapshot!(cli.command, @r#"
    Some(
        Run(
            RunArgs {
                repo: RepoArgs {
                    repo: Some(
                        "/tmp/repo",
                    ),
                },
                delay_ms: 250,
                keep_going: true,
                steps: [
                    "fetch --all",
                    "status --short",
                ],
            },
        ),
    )
    "#);
    assert_eq!(cli.global.log_level, Some(4));
}

#[test]
fn test_run_requires_steps() {
    let err = Cli::try_parse_from(["gitsched", "run"]).unwrap_err();
    assert_eq!(
        err.kind(),
        clap::error::ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn test_parse_status_json() {
    let cli = Cli::try_parse_from(["gitsched", "status", "--json"]).unwrap();
    match cli.command {
        Some(Command::Status(args)) => {
            assert!(args.json);
            assert!(args.repo.repo.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_log_level_out_of_range() {
    assert!(Cli::try_parse_from(["gitsched", "-l", "7", "version"]).is_err());
}

#[test]
fn test_global_overrides() {
    let cli = Cli::try_parse_from([
        "gitsched",
        "-l",
        "2",
        "--log-file",
        "/tmp/gitsched.log",
        "--json-log",
        "-s",
        "scheduler/worker_name=ops",
        "branch",
    ])
    .unwrap();
    insta::assert_debug_snapshot!(cli.global.to_config_overrides(), @r#"
    [
        "scheduler/worker_name=ops",
        "global/output_log_level=2",
        "global/file_log_level=2",
        "global/log_file=/tmp/gitsched.log",
        "global/json_log=true",
    ]
    "#);
}

#[test]
fn test_no_overrides_by_default() {
    assert!(GlobalOptions::default().to_config_overrides().is_empty());
}
