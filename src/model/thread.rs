use serde::{Deserialize, Serialize};

/// A pull-request review thread (conversation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewThread {
    /// GraphQL node ID
    pub id: String,

    pub is_resolved: bool,

    #[serde(default)]
    pub is_outdated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default)]
    pub comments: Vec<ThreadComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadComment {
    pub id: String,

    /// Login of the author; empty for deleted accounts.
    #[serde(default)]
    pub author: String,

    pub body: String,

    #[serde(default)]
    pub url: String,
}

impl ReviewThread {
    /// The comment that opened the thread.
    pub fn first_comment(&self) -> Option<&ThreadComment> {
        self.comments.first()
    }

    pub fn author(&self) -> &str {
        self.first_comment().map(|c| c.author.as_str()).unwrap_or("")
    }

    /// `path:line`, `path`, or `(general)` for threads without a location.
    pub fn location(&self) -> String {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => format!("{}:{}", path, line),
            (Some(path), None) => path.clone(),
            _ => "(general)".to_string(),
        }
    }

    /// First line of the opening comment, truncated to `max_len` characters.
    pub fn preview(&self, max_len: usize) -> String {
        let body = self.first_comment().map(|c| c.body.as_str()).unwrap_or("");
        truncate_line(body, max_len)
    }
}

fn truncate_line(body: &str, max_len: usize) -> String {
    let first_line = body.lines().next().unwrap_or(body);
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
