use super::types::{IssueState, IssueType};
use serde::{Deserialize, Serialize};

/// An issue as seen by the hierarchy helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,

    #[serde(default)]
    pub state: IssueState,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Sub-issue numbers (or tasklist references on legacy issues).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<u64>,

    /// Issues that must close before this one can start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<u64>,

    #[serde(skip)]
    pub body: String,
}

impl Issue {
    pub fn new(number: u64, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            state: IssueState::default(),
            issue_type: None,
            labels: Vec::new(),
            children: Vec::new(),
            blocked_by: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_state(mut self, state: IssueState) -> Self {
        self.state = state;
        self
    }

    pub fn with_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    pub fn with_children(mut self, children: Vec<u64>) -> Self {
        self.children = children;
        self
    }

    pub fn with_blocked_by(mut self, blocked_by: Vec<u64>) -> Self {
        self.blocked_by = blocked_by;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}
