use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnokyeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Project not initialized. Run 'anokye init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("`{program}` exited with {}: {stderr}", describe_exit(.code))]
    Command {
        program: String,
        code: Option<i32>,
        stderr: String,
        transient: bool,
    },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<AnokyeError> },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Dependency cycle between issues: {0:?}")]
    Cycle(Vec<u64>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl AnokyeError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AnokyeError::Transient(_) => true,
            AnokyeError::Command { transient, .. } => *transient,
            _ => false,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AnokyeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AnokyeError::Transient("timeout".into()).is_transient());
        assert!(!AnokyeError::GraphQl("bad field".into()).is_transient());
        let cmd = AnokyeError::Command {
            program: "gh".into(),
            code: Some(1),
            stderr: "HTTP 502".into(),
            transient: true,
        };
        assert!(cmd.is_transient());
    }

    #[test]
    fn test_command_error_display() {
        let err = AnokyeError::Command {
            program: "git".into(),
            code: Some(128),
            stderr: "fatal: not a git repository".into(),
            transient: false,
        };
        assert_eq!(
            err.to_string(),
            "`git` exited with status 128: fatal: not a git repository"
        );
    }
}
