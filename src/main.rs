// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Run | Branch | Status | Options | Inis | Version
//!                 Ctrl+C --> CancellationToken --> shutdown hook
//! ```

use std::process::ExitCode;

use gitsched::cli::global::GlobalOptions;
use gitsched::cli::{self, Command};
use gitsched::cmd::config::{run_inis_command, run_options_command};
use gitsched::cmd::repo::{run_branch_command, run_status_command};
use gitsched::cmd::run::run_steps_command;
use gitsched::config::loader::ConfigLoader;
use gitsched::config::types::GlobalConfig;
use gitsched::config::{Config, DEFAULT_CONFIG_FILE, ENV_PREFIX};
use gitsched::error::Result;
use gitsched::logging::init_logging;
use gitsched::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();
    let config = load_config(&cli.global);

    let log_config = config.as_ref().map_or_else(
        |_| build_log_config(&cli.global),
        |config| log_config_from(&config.global),
    );
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let interrupt = CancellationToken::new();
    spawn_interrupt_listener(interrupt.clone());

    dispatch_command(&cli, config, &interrupt).await
}

fn spawn_interrupt_listener(interrupt: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping git operations");
            interrupt.cancel();
        }
    });
}

/// Logging settings before a configuration is available.
fn build_log_config(global: &GlobalOptions) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::INFO);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(console_level);

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .with_json_file(global.json_log)
        .build()
}

fn log_config_from(global: &GlobalConfig) -> LogConfig {
    LogConfig::builder()
        .with_console_level(global.output_log_level)
        .with_file_level(global.file_log_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .with_json_file(global.json_log)
        .build()
}

async fn dispatch_command(
    cli: &cli::Cli,
    config: Result<Config>,
    interrupt: &CancellationToken,
) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Inis) => {
            let loader = build_config_loader(&cli.global);
            run_inis_command(&loader.format_loaded_files());
            Ok(())
        }
        Some(command) => match config {
            Ok(config) => run_configured_command(command, &config, interrupt).await,
            Err(e) => Err(e.context("Failed to load config")),
        },
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_configured_command(
    command: &Command,
    config: &Config,
    interrupt: &CancellationToken,
) -> Result<()> {
    match command {
        Command::Options(args) => run_options_command(args, config),
        Command::Run(args) => run_steps_command(args, config, interrupt).await,
        Command::Branch(args) => run_branch_command(args, config),
        Command::Status(args) => run_status_command(args, config),
        Command::Version | Command::Inis => Ok(()),
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_inis {
        loader = loader.add_toml_file_optional(DEFAULT_CONFIG_FILE);
    }
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader.with_env_prefix(ENV_PREFIX)
}

fn load_config(global: &GlobalOptions) -> Result<Config> {
    build_config_loader(global)
        .with_overrides(&global.to_config_overrides())?
        .build()
}
