use crate::error::{AnokyeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".anokye.toml";

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnokyeConfig {
    #[serde(default)]
    pub github: GithubSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub completion: CompletionSettings,

    #[serde(default)]
    pub governance: GovernanceSettings,

    #[serde(default)]
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Shell out to `gh api graphql`.
    #[default]
    Gh,
    /// POST directly to the GraphQL endpoint.
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,

    #[serde(default)]
    pub transport: TransportKind,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            transport: TransportKind::default(),
            endpoint: default_endpoint(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default = "default_reply_template")]
    pub reply_template: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_max_iterations() -> u32 {
    10
}

fn default_wait_seconds() -> u64 {
    30
}

fn default_commit_message() -> String {
    "Address review feedback".to_string()
}

fn default_reply_template() -> String {
    "Addressed in {sha}.".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            wait_seconds: default_wait_seconds(),
            commit_message: default_commit_message(),
            reply_template: default_reply_template(),
            remote: default_remote(),
        }
    }
}

impl CompletionSettings {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceSettings {
    #[serde(default = "default_allowlist_path")]
    pub allowlist_path: String,

    #[serde(default = "default_rules_path")]
    pub rules_path: String,
}

fn default_allowlist_path() -> String {
    ".github/approved-agents.json".to_string()
}

fn default_rules_path() -> String {
    ".github/auto-approve-rules.json".to_string()
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            allowlist_path: default_allowlist_path(),
            rules_path: default_rules_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Extra rules tried before the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleSetting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetting {
    pub category: String,
    pub pattern: String,
}

impl AnokyeConfig {
    /// Find and parse the nearest `.anokye.toml`, returning it with the project root.
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf)> {
        let content = std::fs::read_to_string(config_path)?;
        let config: AnokyeConfig = toml::from_str(&content)?;
        config.validate()?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| AnokyeError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(AnokyeError::NotInitialized);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AnokyeError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(AnokyeError::Config(
                "retry.multiplier must be >= 1.0".to_string(),
            ));
        }
        if self.completion.max_iterations == 0 {
            return Err(AnokyeError::Config(
                "completion.max_iterations must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.github.endpoint).map_err(|e| {
            AnokyeError::Config(format!(
                "github.endpoint '{}' is not a valid URL: {}",
                self.github.endpoint, e
            ))
        })?;
        Ok(())
    }

    /// `owner/repo` pair, or a config error when either half is missing.
    pub fn repository(&self) -> Result<(String, String)> {
        if self.github.owner.is_empty() || self.github.repo.is_empty() {
            return Err(AnokyeError::Config(
                "Repository not configured. Set [github] owner/repo or pass --repo owner/name"
                    .to_string(),
            ));
        }
        Ok((self.github.owner.clone(), self.github.repo.clone()))
    }

    pub fn allowlist_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.governance.allowlist_path)
    }

    pub fn rules_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.governance.rules_path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::files::write_atomic(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: AnokyeConfig = toml::from_str("").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.completion.max_iterations, 10);
        assert_eq!(config.completion.wait_seconds, 30);
        assert_eq!(config.github.transport, TransportKind::Gh);
        assert_eq!(config.governance.allowlist_path, ".github/approved-agents.json");
    }

    #[test]
    fn test_partial_section() {
        let config: AnokyeConfig = toml::from_str(
            r#"
[github]
owner = "acme"
repo = "widgets"
transport = "http"

[completion]
max_iterations = 3
"#,
        )
        .unwrap();
        assert_eq!(config.repository().unwrap(), ("acme".into(), "widgets".into()));
        assert_eq!(config.github.transport, TransportKind::Http);
        assert_eq!(config.github.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.completion.max_iterations, 3);
        assert_eq!(config.completion.wait_seconds, 30);
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        AnokyeConfig::default()
            .save(&temp_dir.path().join(CONFIG_FILE))
            .unwrap();

        let (_, root) = AnokyeConfig::load(&nested).unwrap();
        assert_eq!(root, temp_dir.path());
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            AnokyeConfig::load(temp_dir.path()),
            Err(AnokyeError::NotInitialized)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = AnokyeConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = AnokyeConfig::default();
        config.github.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_repository_missing() {
        assert!(AnokyeConfig::default().repository().is_err());
    }
}
