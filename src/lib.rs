//! # Anokye - governance tooling for agent-authored repositories
//!
//! In the Anokye-Krom model humans open issues and review pull requests while
//! AI agents make every commit. This crate is the executable side of that
//! model: it drives `gh` and `git` to keep review loops, issue hierarchies and
//! agent approvals in order.
//!
//! ## Features
//!
//! - **Review loop**: fetch unresolved review threads, classify them, let an
//!   agent edit, then commit, push, reply and resolve until nothing is left
//! - **GraphQL with retry**: every API call backs off exponentially on
//!   rate limits and transient failures
//! - **Issue DAG**: sub-issues and `Blocked by` lines become a graph with
//!   readiness, blocking and completion queries
//! - **Agent allowlist**: `.github/approved-agents.json` plus auto-approve rules
//!
//! ## Quick Start
//!
//! ```bash
//! anokye init --repo acme/widgets
//! anokye threads 42
//! anokye complete 42 --auto 120
//! anokye issue tree 7
//! anokye agents add 'renovate[bot]' --approved-by octocat
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions and handlers
//! - [`github`]: `gh`/HTTP GraphQL access, review threads, issues
//! - [`classify`]: Review comment classifier
//! - [`completion`]: The PR-completion loop
//! - [`dag`]: Issue hierarchy queries
//! - [`allowlist`] / [`approval`]: Agent approval files

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `.anokye.toml` configuration files and project discovery.
pub mod config;

/// Error types and result aliases.
///
/// Defines `AnokyeError` enum and `Result<T>` type alias.
pub mod error;

/// Access to GitHub through the `gh` CLI or the GraphQL endpoint.
pub mod github;

/// Data models: review threads, issues, pull request summaries.
pub mod model;

/// Issue-template field patterns.
pub mod validation;

pub mod allowlist;
pub mod approval;
pub mod classify;
pub mod completion;
pub mod dag;
pub mod files;
pub mod git;
pub mod logging;

/// Recording test double for the process seam.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
