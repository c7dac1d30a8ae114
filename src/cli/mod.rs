pub mod commands;
pub mod handlers;

pub use commands::{AgentsAction, Cli, Commands, IssueAction};
