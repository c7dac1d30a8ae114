//! Field validation shared by the issue templates and the allowlist.

use crate::error::{AnokyeError, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// Issue reference as typed into a template: `12` or `#12`.
pub const ISSUE_NUMBER_PATTERN: &str = r"^#?\d+$";

/// GitHub login: alphanumerics and single hyphens, no leading/trailing hyphen, 39 chars max.
pub const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,37}[a-zA-Z0-9])?$";

/// GitHub App bot login, e.g. `copilot[bot]`.
pub const BOT_USERNAME_PATTERN: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,37}[a-zA-Z0-9])?\[bot\]$";

/// Numeric GitHub App ID.
pub const APP_ID_PATTERN: &str = r"^\d+$";

static ISSUE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ISSUE_NUMBER_PATTERN).expect("valid issue number pattern"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(USERNAME_PATTERN).expect("valid username pattern"));
static BOT_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BOT_USERNAME_PATTERN).expect("valid bot username pattern"));
static APP_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(APP_ID_PATTERN).expect("valid app id pattern"));

/// Kinds of template field that carry a format constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    IssueNumber,
    Username,
    BotUsername,
    AppId,
}

impl FieldKind {
    pub fn pattern(&self) -> &'static str {
        match self {
            FieldKind::IssueNumber => ISSUE_NUMBER_PATTERN,
            FieldKind::Username => USERNAME_PATTERN,
            FieldKind::BotUsername => BOT_USERNAME_PATTERN,
            FieldKind::AppId => APP_ID_PATTERN,
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            FieldKind::IssueNumber => &ISSUE_NUMBER_RE,
            FieldKind::Username => &USERNAME_RE,
            FieldKind::BotUsername => &BOT_USERNAME_RE,
            FieldKind::AppId => &APP_ID_RE,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FieldKind::IssueNumber => "issue number",
            FieldKind::Username => "GitHub username",
            FieldKind::BotUsername => "bot username",
            FieldKind::AppId => "GitHub App ID",
        }
    }
}

impl FromStr for FieldKind {
    type Err = AnokyeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "issue" | "issue-number" => Ok(FieldKind::IssueNumber),
            "username" | "user" => Ok(FieldKind::Username),
            "bot" | "bot-username" => Ok(FieldKind::BotUsername),
            "app-id" | "app" => Ok(FieldKind::AppId),
            _ => Err(AnokyeError::Validation(format!("Unknown field kind: {}", s))),
        }
    }
}

/// Check `value` against the pattern for `kind`.
pub fn validate_field(kind: FieldKind, value: &str) -> Result<()> {
    if kind.regex().is_match(value) {
        Ok(())
    } else {
        Err(AnokyeError::Validation(format!(
            "'{}' is not a valid {} (expected {})",
            value,
            kind.label(),
            kind.pattern()
        )))
    }
}

pub fn is_valid_username(login: &str) -> bool {
    USERNAME_RE.is_match(login)
}

pub fn is_valid_bot_username(login: &str) -> bool {
    BOT_USERNAME_RE.is_match(login)
}

/// Parse `12` or `#12` into an issue number.
pub fn parse_issue_number(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    validate_field(FieldKind::IssueNumber, trimmed)?;
    trimmed
        .trim_start_matches('#')
        .parse()
        .map_err(|_| AnokyeError::Validation(format!("Issue number out of range: {}", value)))
}

/// Split `owner/name` into its halves.
pub fn parse_repo_slug(slug: &str) -> Result<(String, String)> {
    match slug.split_once('/') {
        Some((owner, name))
            if is_valid_username(owner)
                && !name.is_empty()
                && !name.contains('/')
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) =>
        {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(AnokyeError::Validation(format!(
            "Expected repository as owner/name, got '{}'",
            slug
        ))),
    }
}
