// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::loader::parse_override;
use super::types::{DEFAULT_SHUTDOWN_TIMEOUT_MS, DEFAULT_WORKER_NAME, SchedulerConfig};
use super::{Config, ConfigLoader};
use crate::logging::LogLevel;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.scheduler.worker_name, DEFAULT_WORKER_NAME);
    assert_eq!(
        config.scheduler.shutdown_timeout(),
        Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS)
    );
    assert_eq!(config.global.output_log_level, LogLevel::INFO);
    assert_eq!(config.git.executable, PathBuf::from("git"));
    assert!(config.git.repo.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_full_config() {
    let config = Config::parse(
        r#"
[global]
output_log_level = 4
log_file = "logs/gitsched.log"
json_log = true

[scheduler]
worker_name = "repo-ops"
shutdown_timeout_ms = 500

[git]
executable = "/usr/bin/git"
repo = "/src/project"
"#,
    )
    .expect("config should parse");

    assert_eq!(config.global.output_log_level, LogLevel::DEBUG);
    assert_eq!(
        config.global.log_file,
        Some(PathBuf::from("logs/gitsched.log"))
    );
    assert!(config.global.json_log);
    assert_eq!(config.scheduler.worker_name, "repo-ops");
    assert_eq!(config.scheduler.shutdown_timeout(), Duration::from_millis(500));
    assert_eq!(config.git.repo, Some(PathBuf::from("/src/project")));
}

#[test]
fn test_parse_rejects_unknown_keys() {
    let result = Config::parse("[scheduler]\nthreads = 4\n");
    assert!(result.is_err(), "unknown scheduler keys must be rejected");
}

#[test]
fn test_parse_rejects_bad_log_level() {
    assert!(Config::parse("[global]\noutput_log_level = 9\n").is_err());
}

#[test]
fn test_scheduler_validation() {
    let zero = SchedulerConfig {
        shutdown_timeout_ms: 0,
        ..SchedulerConfig::default()
    };
    insta::assert_snapshot!(
        zero.validate().unwrap_err().to_string(),
        @"invalid value for 'shutdown_timeout_ms' in section '[scheduler]': expected 1..=60000, got 0"
    );

    let blank = SchedulerConfig {
        worker_name: "  ".to_string(),
        ..SchedulerConfig::default()
    };
    insta::assert_snapshot!(
        blank.validate().unwrap_err().to_string(),
        @"invalid value for 'worker_name' in section '[scheduler]': must not be empty"
    );

    let max = SchedulerConfig {
        shutdown_timeout_ms: 60_000,
        ..SchedulerConfig::default()
    };
    assert!(max.validate().is_ok());
}

#[test]
fn test_build_runs_validation() {
    let result = Config::parse("[scheduler]\nshutdown_timeout_ms = 120000\n");
    let err = result.expect_err("out-of-range timeout must fail");
    assert!(format!("{err:#}").contains("shutdown_timeout_ms"));
}

#[test]
fn test_empty_git_executable_is_missing() {
    let result = Config::parse("[git]\nexecutable = \"\"\n");
    let err = result.expect_err("empty executable must fail");
    insta::assert_snapshot!(err.to_string(), @"missing required config key 'executable' in section '[git]'");
}

#[test]
fn test_format_options() {
    let config = Config::default();
    insta::assert_snapshot!(config.format_options().join("\n"), @r"
    git.executable                = git
    git.repo                      =
    global.file_log_level         = 5
    global.json_log               = false
    global.log_file               =
    global.output_log_level       = 3
    scheduler.shutdown_timeout_ms = 2000
    scheduler.worker_name         = git-operations
    ");
}

// --- Override parsing ---

#[test]
fn test_parse_override_forms() {
    insta::assert_debug_snapshot!(
        [
            parse_override("scheduler/worker_name=ops").ok(),
            parse_override("scheduler.shutdown_timeout_ms = 100").ok(),
            parse_override("git/repo=/a=b").ok(),
        ],
        @r#"
    [
        Some(
            (
                "scheduler.worker_name",
                "ops",
            ),
        ),
        Some(
            (
                "scheduler.shutdown_timeout_ms",
                "100",
            ),
        ),
        Some(
            (
                "git.repo",
                "/a=b",
            ),
        ),
    ]
    "#
    );
}

#[test]
fn test_parse_override_errors() {
    assert!(parse_override("no-equals-sign").is_err());
    assert!(parse_override("worker_name=ops").is_err());
    assert!(parse_override("/worker_name=ops").is_err());
}

// --- ConfigLoader Tests ---

#[test]
fn test_config_loader_add_toml_file_success() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(
        file,
        r#"
[scheduler]
shutdown_timeout_ms = 750
"#
    )
    .expect("failed to write temp file");

    let loader = ConfigLoader::new().add_toml_file(file.path());
    assert_eq!(loader.loaded_files().len(), 1);
    let config = loader.build().expect("build should succeed");
    assert_eq!(config.scheduler.shutdown_timeout_ms, 750);
}

#[test]
fn test_config_loader_add_toml_file_not_found() {
    let loader = ConfigLoader::new().add_toml_file("/nonexistent/path/to/gitsched.toml");
    assert!(loader.build().is_err());
}

#[test]
fn test_config_loader_optional_file_missing() {
    let loader = ConfigLoader::new().add_toml_file_optional("/nonexistent/gitsched.toml");
    assert!(loader.loaded_files().is_empty());
    let config = loader.build().expect("missing optional file is fine");
    assert_eq!(config.scheduler.worker_name, DEFAULT_WORKER_NAME);
}

#[test]
fn test_config_loader_with_env_prefix() {
    // SAFETY: The variable name is unique to this test.
    unsafe {
        std::env::set_var("GITSCHEDTEST_SCHEDULER__SHUTDOWN_TIMEOUT_MS", "1234");
    }

    let config = ConfigLoader::new()
        .add_toml_str("[scheduler]\nshutdown_timeout_ms = 10")
        .with_env_prefix("GITSCHEDTEST")
        .build()
        .expect("build should succeed");

    assert_eq!(config.scheduler.shutdown_timeout_ms, 1234);

    // SAFETY: Same as above
    unsafe {
        std::env::remove_var("GITSCHEDTEST_SCHEDULER__SHUTDOWN_TIMEOUT_MS");
    }
}

#[test]
fn test_config_loader_overrides_win() {
    let config = ConfigLoader::new()
        .add_toml_str("[scheduler]\nworker_name = \"from-file\"\nshutdown_timeout_ms = 10")
        .with_overrides(&["scheduler/worker_name=from-cli", "scheduler.shutdown_timeout_ms=20"])
        .expect("overrides should apply")
        .build()
        .expect("build should succeed");

    assert_eq!(config.scheduler.worker_name, "from-cli");
    assert_eq!(config.scheduler.shutdown_timeout_ms, 20);
}

#[test]
fn test_config_loader_format_loaded_files() {
    let loader = ConfigLoader::new().add_toml_str("").add_toml_str("");
    insta::assert_snapshot!(loader.format_loaded_files().join("\n"), @r"
    1. [string] <string>
    2. [string] <string>
    ");
}
