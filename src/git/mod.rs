// gitsched: Git Operation Scheduler
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git call sites.
//!
//! ```text
//!        Public API
//!   actions.rs (GitActions, scheduled)
//!        |            \
//!        v             v
//!    ops.rs          query.rs
//!  GitOperation     RepoStatus
//!        |             |
//!        v             v
//!   ShellBackend    GixBackend
//!   (git CLI,       (gix, read-only)
//!    interruptible)
//! ```
//!
//! Nothing here touches a repository off the scheduler's worker except
//! [`GitActions::open`], which only checks that the repository exists.

pub mod actions;
pub mod backend;
pub mod ops;
pub mod query;

pub use actions::GitActions;
pub use ops::GitOperation;
pub use query::RepoStatus;

#[cfg(test)]
mod tests;
