// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing.
//!
//! Tests the CLI module with realistic command-line argument patterns.

use clap::Parser;
use gitsched::cli::{Cli, Command};

// =============================================================================
// Version / Options / Inis
// =============================================================================

#[test]
fn cli_version_alias() {
    let cli = Cli::try_parse_from(["gitsched", "-v"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn cli_options_json() {
    let cli = Cli::try_parse_from(["gitsched", "options", "--json"]).unwrap();
    insta::assert_debug_snapshot!(cli.command, @r"
    Some(
        Options(
            OptionsArgs {
                json: true,
            },
        ),
    )
    ");
}

#[test]
fn cli_inis_with_files() {
    let cli = Cli::try_parse_from([
        "gitsched",
        "--no-default-inis",
        "-i",
        "a.toml",
        "--ini",
        "b.toml",
        "inis",
    ])
    .unwrap();
    assert!(cli.global.no_default_inis);
    insta::assert_debug_snapshot!(cli.global.inis, @r#"
    [
        "a.toml",
        "b.toml",
    ]
    "#);
}

#[test]
fn cli_no_command() {
    let cli = Cli::try_parse_from(["gitsched"]).unwrap();
    assert!(cli.command.is_none());
}

// =============================================================================
// Run Command
// =============================================================================

#[test]
fn cli_run_defaults() {
    let cli = Cli::try_parse_from(["gitsched", "run", "status"]).unwrap();
    match cli.command {
        Some(Command::Run(args)) => {
            assert_eq!(args.delay_ms, 0);
            assert!(!args.keep_going);
            assert!(args.repo.repo.is_none());
            assert_eq!(args.steps, ["status"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_run_rejects_bad_delay() {
    let result = Cli::try_parse_from(["gitsched", "run", "--delay-ms", "soon", "status"]);
    assert!(result.is_err());
}

// =============================================================================
// Branch / Status
// =============================================================================

#[test]
fn cli_branch_with_repo() {
    let cli = Cli::try_parse_from(["gitsched", "branch", "--repo", "/work/project"]).unwrap();
    insta::assert_debug_snapshot!(cli.command, @r#"
    Some(
        Branch(
            RepoArgs {
                repo: Some(
                    "/work/project",
                ),
            },
        ),
    )
    "#);
}

#[test]
fn cli_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["gitsched", "build"]).is_err());
}
