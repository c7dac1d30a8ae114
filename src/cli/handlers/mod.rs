mod agents;
mod approve;
mod classify;
mod complete;
mod graphql;
mod init;
mod issue;
mod threads;
mod utils;
mod validate;

pub use agents::handle_agents;
pub use approve::handle_approve_check;
pub use classify::handle_classify;
pub use complete::{CompleteParams, handle_complete};
pub use graphql::handle_graphql;
pub use init::handle_init;
pub use issue::handle_issue;
pub use threads::{handle_reply, handle_resolve, handle_threads};
pub use validate::handle_validate;

use crate::classify::Classifier;
use crate::config::AnokyeConfig;
use crate::error::AnokyeError;
use crate::github::{self, GraphqlClient};
use crate::validation::parse_repo_slug;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Exit code when `complete` stops at the iteration cap.
pub const EXIT_ITERATION_LIMIT: u8 = 2;
/// Exit code when the operator aborts `complete`.
pub const EXIT_ABORTED: u8 = 3;

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: AnokyeConfig,
    pub root: PathBuf,
    repo_override: Option<String>,
}

impl CommandContext {
    /// Load the project config, honouring `--config` and `--repo`.
    pub fn load(config_path: Option<&str>, repo: Option<&str>) -> Result<Self> {
        let (config, root) = match config_path {
            Some(path) => AnokyeConfig::load_from(Path::new(path))
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => {
                let cwd = std::env::current_dir()?;
                AnokyeConfig::load(&cwd).context("Failed to load anokye configuration")?
            }
        };
        Ok(Self {
            config,
            root,
            repo_override: repo.map(str::to_string),
        })
    }

    /// Like [`CommandContext::load`], but an uninitialized directory gets
    /// default settings rooted at the working directory.
    pub fn load_or_default(config_path: Option<&str>, repo: Option<&str>) -> Result<Self> {
        match Self::load(config_path, repo) {
            Ok(ctx) => Ok(ctx),
            Err(e)
                if config_path.is_none()
                    && matches!(
                        e.downcast_ref::<AnokyeError>(),
                        Some(AnokyeError::NotInitialized)
                    ) =>
            {
                Ok(Self {
                    config: AnokyeConfig::default(),
                    root: std::env::current_dir()?,
                    repo_override: repo.map(str::to_string),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// `(owner, name)` from `--repo` or the `[github]` section.
    pub fn repository(&self) -> Result<(String, String)> {
        match &self.repo_override {
            Some(slug) => Ok(parse_repo_slug(slug)?),
            None => Ok(self.config.repository()?),
        }
    }

    pub fn slug(&self) -> Result<String> {
        let (owner, name) = self.repository()?;
        Ok(format!("{}/{}", owner, name))
    }

    pub fn client(&self) -> Result<GraphqlClient> {
        Ok(github::client_from_config(&self.config)?)
    }

    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier::with_rules(&self.config.classifier.rules)?)
    }

    pub fn allowlist_path(&self) -> PathBuf {
        self.config.allowlist_path(&self.root)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.config.rules_path(&self.root)
    }
}
