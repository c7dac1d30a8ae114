//! Auto-approve rules (`.github/auto-approve-rules.json`).
//!
//! A pull request is approved when its author is on the allowlist and at
//! least one rule accepts every aspect of the change.

use crate::allowlist::{Allowlist, same_login};
use crate::error::{AnokyeError, Result};
use crate::files::write_json;
use crate::model::PullSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub name: String,

    /// Authors the rule applies to; empty means any approved agent.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Path prefixes every changed file must fall under; empty means anywhere.
    #[serde(default)]
    pub allowed_paths: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_changed_lines: Option<u64>,

    #[serde(default)]
    pub required_labels: Vec<String>,

    #[serde(default)]
    pub forbidden_labels: Vec<String>,

    /// Allowlist scope the author must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_scope: Option<String>,
}

fn has_label(pr: &PullSummary, label: &str) -> bool {
    pr.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_start_matches("./");
    if prefix.is_empty() || prefix == "*" {
        return true;
    }
    path == prefix.trim_end_matches('/')
        || (path.starts_with(prefix)
            && (prefix.ends_with('/') || path[prefix.len()..].starts_with('/')))
}

impl ApprovalRule {
    /// Reasons this rule does not accept `pr`; empty when it does.
    pub fn check(&self, pr: &PullSummary, allowlist: &Allowlist) -> Vec<String> {
        let mut failures = Vec::new();

        if !self.authors.is_empty() && !self.authors.iter().any(|a| same_login(a, &pr.author)) {
            failures.push(format!("author {} not covered", pr.author));
        }

        if let Some(scope) = &self.required_scope {
            let scoped = allowlist
                .find(&pr.author)
                .is_some_and(|agent| agent.allows_scope(scope));
            if !scoped {
                failures.push(format!("author lacks scope '{}'", scope));
            }
        }

        if !self.allowed_paths.is_empty() {
            let outside: Vec<&str> = pr
                .files
                .iter()
                .filter(|f| !self.allowed_paths.iter().any(|p| under_prefix(f, p)))
                .map(String::as_str)
                .collect();
            if !outside.is_empty() {
                failures.push(format!("files outside allowed paths: {}", outside.join(", ")));
            }
        }

        if let Some(max) = self.max_changed_lines {
            if pr.changed_lines() > max {
                failures.push(format!("{} changed lines exceeds {}", pr.changed_lines(), max));
            }
        }

        let missing: Vec<&str> = self
            .required_labels
            .iter()
            .filter(|l| !has_label(pr, l))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            failures.push(format!("missing labels: {}", missing.join(", ")));
        }

        let forbidden: Vec<&str> = self
            .forbidden_labels
            .iter()
            .filter(|l| has_label(pr, l))
            .map(String::as_str)
            .collect();
        if !forbidden.is_empty() {
            failures.push(format!("forbidden labels: {}", forbidden.join(", ")));
        }

        failures
    }
}

/// Read the rule list; a missing file means no rules.
pub fn load_rules(path: &Path) -> Result<Vec<ApprovalRule>> {
    if !path.exists() {
        debug!(path = %path.display(), "No auto-approve rules file");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let rules: Vec<ApprovalRule> = serde_json::from_str(&content)?;
    validate_rules(&rules)?;
    Ok(rules)
}

pub fn save_rules(path: &Path, rules: &[ApprovalRule]) -> Result<()> {
    validate_rules(rules)?;
    write_json(path, rules)
}

pub fn validate_rules(rules: &[ApprovalRule]) -> Result<()> {
    let mut names = HashSet::new();
    for rule in rules {
        if rule.name.trim().is_empty() {
            return Err(AnokyeError::Validation("Rule name cannot be empty".to_string()));
        }
        if !names.insert(rule.name.to_lowercase()) {
            return Err(AnokyeError::Validation(format!(
                "Duplicate rule name: {}",
                rule.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub approved: bool,
    /// Rule that approved the pull request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Why approval was refused, one entry per failed rule.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl Decision {
    fn refuse(reasons: Vec<String>) -> Self {
        Self {
            approved: false,
            rule: None,
            reasons,
        }
    }
}

/// First rule that accepts `pr` wins.
pub fn evaluate(rules: &[ApprovalRule], allowlist: &Allowlist, pr: &PullSummary) -> Decision {
    if !allowlist.is_approved(&pr.author) {
        return Decision::refuse(vec![format!(
            "author {} is not on the approved-agents allowlist",
            pr.author
        )]);
    }
    if rules.is_empty() {
        return Decision::refuse(vec!["no auto-approve rules configured".to_string()]);
    }

    let mut reasons = Vec::new();
    for rule in rules {
        let failures = rule.check(pr, allowlist);
        if failures.is_empty() {
            debug!(pr = pr.number, rule = %rule.name, "Rule approved pull request");
            return Decision {
                approved: true,
                rule: Some(rule.name.clone()),
                reasons: Vec::new(),
            };
        }
        reasons.push(format!("{}: {}", rule.name, failures.join("; ")));
    }
    Decision::refuse(reasons)
}
