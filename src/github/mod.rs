//! GitHub access through the `gh` CLI or the GraphQL HTTP endpoint.

pub mod cli;
pub mod graphql;
pub mod issues;
pub mod runner;
pub mod threads;

pub use cli::GhCli;
pub use graphql::{GraphqlClient, GraphqlRequest, GraphqlTransport, RetryPolicy};
pub use issues::IssuesApi;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use threads::ThreadsApi;

use crate::config::{AnokyeConfig, TransportKind};
use crate::error::{AnokyeError, Result};
use graphql::{GhTransport, HttpTransport};

/// Build a GraphQL client using the transport and retry policy from `config`.
pub fn client_from_config(config: &AnokyeConfig) -> Result<GraphqlClient> {
    let transport: Box<dyn GraphqlTransport> = match config.github.transport {
        TransportKind::Gh => Box::new(GhTransport::new(SystemRunner::new())),
        TransportKind::Http => {
            let token = std::env::var(&config.github.token_env).map_err(|_| {
                AnokyeError::Config(format!(
                    "transport = \"http\" needs a token in ${}",
                    config.github.token_env
                ))
            })?;
            Box::new(HttpTransport::new(&config.github.endpoint, token)?)
        }
    };
    Ok(GraphqlClient::new(transport, RetryPolicy::from(&config.retry)))
}
