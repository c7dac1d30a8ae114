//! The approved-agents allowlist (`.github/approved-agents.json`).
//!
//! Only accounts listed here may have their pull requests auto-approved.
//! The file is meant to be edited through reviewed pull requests, so it is
//! written as stable, pretty-printed JSON.

use crate::error::{AnokyeError, Result};
use crate::files::write_json;
use crate::validation::{FieldKind, is_valid_bot_username, is_valid_username, validate_field};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fmt;
use tracing::{debug, info};

pub const ALLOWLIST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Bot,
    User,
}

impl AgentKind {
    /// `name[bot]` logins are bots, everything else a machine user.
    pub fn infer(username: &str) -> Self {
        if username.ends_with("[bot]") {
            AgentKind::Bot
        } else {
            AgentKind::User
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Bot => write!(f, "bot"),
            AgentKind::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedAgent {
    pub username: String,
    pub kind: AgentKind,

    /// GitHub App ID, for bot accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Human who approved the agent.
    pub approved_by: String,

    pub approved_at: DateTime<Utc>,

    /// Areas the agent may work in; empty means unrestricted.
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApprovedAgent {
    pub fn new(username: impl Into<String>, approved_by: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            kind: AgentKind::infer(&username),
            username,
            app_id: None,
            approved_by: approved_by.into(),
            approved_at: Utc::now(),
            scopes: Vec::new(),
            notes: None,
        }
    }

    pub fn allows_scope(&self, scope: &str) -> bool {
        self.scopes.is_empty()
            || self
                .scopes
                .iter()
                .any(|s| s == "*" || s.eq_ignore_ascii_case(scope))
    }

    fn validate(&self) -> Result<()> {
        let valid_name = match self.kind {
            AgentKind::Bot => is_valid_bot_username(&self.username),
            AgentKind::User => is_valid_username(&self.username),
        };
        if !valid_name {
            return Err(AnokyeError::Validation(format!(
                "'{}' is not a valid {} username",
                self.username, self.kind
            )));
        }
        if let Some(app_id) = &self.app_id {
            validate_field(FieldKind::AppId, app_id)?;
        }
        validate_field(FieldKind::Username, &self.approved_by)?;
        Ok(())
    }
}

/// Compare logins the way GitHub does. `app/name` is the `gh` spelling of `name[bot]`.
pub fn same_login(a: &str, b: &str) -> bool {
    normalize_login(a).eq_ignore_ascii_case(&normalize_login(b))
}

pub fn normalize_login(login: &str) -> String {
    match login.strip_prefix("app/") {
        Some(app) => format!("{}[bot]", app),
        None => login.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowlist {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub agents: Vec<ApprovedAgent>,
}

fn default_version() -> u32 {
    ALLOWLIST_VERSION
}

impl Default for Allowlist {
    fn default() -> Self {
        Self {
            version: ALLOWLIST_VERSION,
            agents: Vec::new(),
        }
    }
}

impl Allowlist {
    /// Read the allowlist; a missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No allowlist file");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let list: Allowlist = serde_json::from_str(&content)?;
        if list.version != ALLOWLIST_VERSION {
            return Err(AnokyeError::Config(format!(
                "{}: unsupported allowlist version {}",
                path.display(),
                list.version
            )));
        }
        Ok(list)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)?;
        debug!(path = %path.display(), agents = self.agents.len(), "Saved allowlist");
        Ok(())
    }

    pub fn find(&self, login: &str) -> Option<&ApprovedAgent> {
        self.agents.iter().find(|a| same_login(&a.username, login))
    }

    pub fn is_approved(&self, login: &str) -> bool {
        self.find(login).is_some()
    }

    pub fn add(&mut self, agent: ApprovedAgent) -> Result<()> {
        agent.validate()?;
        if self.is_approved(&agent.username) {
            return Err(AnokyeError::Validation(format!(
                "'{}' is already approved",
                agent.username
            )));
        }
        info!(username = %agent.username, kind = %agent.kind, "Approved agent");
        self.agents.push(agent);
        Ok(())
    }

    pub fn remove(&mut self, login: &str) -> Result<ApprovedAgent> {
        let index = self
            .agents
            .iter()
            .position(|a| same_login(&a.username, login))
            .ok_or_else(|| AnokyeError::NotFound(format!("approved agent '{}'", login)))?;
        let removed = self.agents.remove(index);
        info!(username = %removed.username, "Revoked agent");
        Ok(removed)
    }
}
