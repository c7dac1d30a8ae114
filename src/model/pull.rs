use serde::{Deserialize, Serialize};

/// The parts of a pull request the auto-approve rules look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub author: String,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub additions: u64,

    #[serde(default)]
    pub deletions: u64,

    #[serde(default)]
    pub labels: Vec<String>,
}

impl PullSummary {
    pub fn changed_lines(&self) -> u64 {
        self.additions + self.deletions
    }
}
