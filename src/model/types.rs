use crate::error::{AnokyeError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for IssueState {
    type Err = AnokyeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(IssueState::Open),
            "closed" | "completed" | "not_planned" => Ok(IssueState::Closed),
            _ => Err(AnokyeError::Validation(format!("Invalid issue state: {}", s))),
        }
    }
}

/// Organization-level issue type. Unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Epic,
    Feature,
    Task,
    Bug,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Epic => write!(f, "epic"),
            IssueType::Feature => write!(f, "feature"),
            IssueType::Task => write!(f, "task"),
            IssueType::Bug => write!(f, "bug"),
            IssueType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for IssueType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "epic" => IssueType::Epic,
            "feature" => IssueType::Feature,
            "task" => IssueType::Task,
            "bug" => IssueType::Bug,
            _ => IssueType::Other(s.to_string()),
        }
    }
}

impl IssueType {
    /// Epics and features group other issues rather than carrying work themselves.
    pub fn is_container(&self) -> bool {
        matches!(self, IssueType::Epic | IssueType::Feature)
    }
}
