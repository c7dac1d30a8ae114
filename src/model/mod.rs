//! Data models shared across commands.
//!
//! - [`ReviewThread`]: a pull-request review conversation and its comments
//! - [`Issue`]: a node in the issue hierarchy
//! - [`PullSummary`]: pull-request facts used by the auto-approve rules
//! - [`IssueState`] / [`IssueType`]: issue lifecycle and organization-level type

mod issue;
mod pull;
mod thread;
mod types;

pub use issue::Issue;
pub use pull::PullSummary;
pub use thread::{ReviewThread, ThreadComment};
pub use types::{IssueState, IssueType};
