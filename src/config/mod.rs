// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for gitsched.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low -> high)
//! 1. defaults
//! 2. gitsched.toml (cwd, optional)
//! 3. --ini FILE (repeatable)
//! 4. GITSCHED_* env vars
//! 5. --set section/key=value
//! 6. dedicated CLI flags (--log-level, --log-file)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! GITSCHED_SCHEDULER__WORKER_NAME=git-ops     -> scheduler.worker_name
//! GITSCHED_SCHEDULER__SHUTDOWN_TIMEOUT_MS=500 -> scheduler.shutdown_timeout_ms
//! GITSCHED_GIT__REPO=/src/project             -> git.repo
//! ```
//!
//! # Example
//!
//! ```toml
//! [global]
//! output_log_level = 4
//!
//! [scheduler]
//! worker_name = "git-operations"
//! shutdown_timeout_ms = 2000
//!
//! [git]
//! repo = "/src/project"
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{GitConfig, GlobalConfig, SchedulerConfig};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gitsched.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GITSCHED";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Operation scheduler.
    pub scheduler: SchedulerConfig,
    /// Git call sites.
    pub git: GitConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gitsched::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("gitsched.toml")
    ///     .with_env_prefix("GITSCHED")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Validates value ranges across sections.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.scheduler.validate()?;
        if self.git.executable.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey {
                section: "git".to_string(),
                key: "executable".to_string(),
            });
        }
        Ok(())
    }

    /// Format configuration options for display, sorted by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_scheduler_options(&mut options);
        self.format_git_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| {
                format!("{key:<max_key_len$} = {value}")
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert("global.json_log".into(), self.global.json_log.to_string());
    }

    fn format_scheduler_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "scheduler.worker_name".into(),
            self.scheduler.worker_name.clone(),
        );
        options.insert(
            "scheduler.shutdown_timeout_ms".into(),
            self.scheduler.shutdown_timeout_ms.to_string(),
        );
    }

    fn format_git_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "git.executable".into(),
            self.git.executable.display().to_string(),
        );
        options.insert(
            "git.repo".into(),
            self.git
                .repo
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
    }
}
