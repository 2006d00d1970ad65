// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for gitsched.
//!
//! # Config Structure
//!
//! ```text
//! Config
//!   global     log levels, log file
//!   scheduler  worker_name, shutdown_timeout_ms
//!   git        executable, repo
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default worker thread name prefix.
pub const DEFAULT_WORKER_NAME: &str = "git-operations";

/// Default shutdown wait, in milliseconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

/// Upper bound for `scheduler.shutdown_timeout_ms`.
pub const MAX_SHUTDOWN_TIMEOUT_MS: u64 = 60_000;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file. No file is written when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Write the log file as JSON lines.
    pub json_log: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            json_log: false,
        }
    }
}

/// Operation scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Worker thread name prefix; threads are named `<worker_name>-<generation>`.
    pub worker_name: String,
    /// How long shutdown waits for queued operations, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty worker name or a
    /// timeout outside `1..=60000` ms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                section: "scheduler".to_string(),
                key: "worker_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !(1..=MAX_SHUTDOWN_TIMEOUT_MS).contains(&self.shutdown_timeout_ms) {
            return Err(ConfigError::InvalidValue {
                section: "scheduler".to_string(),
                key: "shutdown_timeout_ms".to_string(),
                message: format!(
                    "expected 1..={MAX_SHUTDOWN_TIMEOUT_MS}, got {}",
                    self.shutdown_timeout_ms
                ),
            });
        }
        Ok(())
    }
}

/// Git call-site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Git executable, resolved through `PATH` when not absolute.
    pub executable: PathBuf,
    /// Repository used when a command gets no `--repo`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<PathBuf>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("git"),
            repo: None,
        }
    }
}
