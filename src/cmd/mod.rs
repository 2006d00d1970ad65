// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   run, branch, status, options, inis
//! ```

pub mod config;
pub mod repo;
pub mod run;

#[cfg(test)]
mod tests;
