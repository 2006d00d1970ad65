// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for gitsched using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! gitsched [global options] <command>
//! run [-C DIR] [--delay-ms N] [--keep-going] STEP...
//! branch [-C DIR]
//! status [-C DIR] [--json]
//! options [--json]
//! inis
//! version
//! ```

pub mod git;
pub mod global;

#[cfg(test)]
mod tests;

use crate::cli::git::{RepoArgs, RunArgs, StatusArgs};
use crate::cli::global::GlobalOptions;
use clap::{Args, Parser, Subcommand};

/// Git Operation Scheduler
///
/// Runs git operations one at a time on a dedicated worker.
#[derive(Debug, Parser)]
#[command(
    name = "gitsched",
    author,
    version,
    about = "Git Operation Scheduler",
    long_about = "gitsched Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Serializes git operations on one repository onto a single\n\
                  worker thread.\n\n\
                  `gitsched run \"fetch --all\" \"status --short\"` runs both steps\n\
                  in order. See `gitsched <command> --help` for more information\n\
                  about a command.",
    after_help = "CONFIG FILES:\n\n\
                  By default, gitsched loads `gitsched.toml` from the current\n\
                  directory if it exists. Additional files can be given with --ini\n\
                  and are loaded after it, later files overriding earlier ones.\n\
                  GITSCHED_<SECTION>__<KEY> environment variables override files,\n\
                  and --set overrides everything. Use --no-default-inis to skip\n\
                  `gitsched.toml`."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their effective values.
    Options(OptionsArgs),

    /// Lists the config files used by gitsched.
    Inis,

    /// Runs git steps in order on the operation worker.
    Run(RunArgs),

    /// Prints the current branch.
    Branch(RepoArgs),

    /// Prints branch, working tree and stash state.
    Status(StatusArgs),
}

/// Arguments for the `options` command.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionsArgs {
    /// Prints the configuration as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
