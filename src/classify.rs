//! Review-comment classification.
//!
//! Rules are tried in order and the first match decides the category.
//! Feedback that matches nothing is treated as a suggestion.

use crate::config::RuleSetting;
use crate::error::{AnokyeError, Result};
use crate::model::ReviewThread;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Blocking,
    Question,
    Praise,
    Nitpick,
    Suggestion,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Blocking,
        Category::Question,
        Category::Praise,
        Category::Nitpick,
        Category::Suggestion,
    ];

    /// Whether the comment asks for a code change.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            Category::Blocking | Category::Nitpick | Category::Suggestion
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Blocking => write!(f, "blocking"),
            Category::Question => write!(f, "question"),
            Category::Praise => write!(f, "praise"),
            Category::Nitpick => write!(f, "nitpick"),
            Category::Suggestion => write!(f, "suggestion"),
        }
    }
}

impl FromStr for Category {
    type Err = AnokyeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blocking" | "blocker" => Ok(Category::Blocking),
            "question" => Ok(Category::Question),
            "praise" => Ok(Category::Praise),
            "nitpick" | "nit" => Ok(Category::Nitpick),
            "suggestion" => Ok(Category::Suggestion),
            _ => Err(AnokyeError::Validation(format!("Invalid category: {}", s))),
        }
    }
}

/// Built-in rules as `(name, category, pattern)`, in evaluation order.
const BUILTIN_RULES: &[(&str, Category, &str)] = &[
    (
        "blocking-marker",
        Category::Blocking,
        r"(?i)\[blocking\]|\bblock(?:er|ing)\b|\bdo(?:n't| not) merge\b|\bmust\b|\brequired?\b",
    ),
    (
        "defect",
        Category::Blocking,
        r"(?i)\b(?:bug|broken|breaks?|crash(?:es)?|panics?|incorrect|wrong|security|vulnerab\w*|race condition|data loss|memory leak|regression)\b",
    ),
    (
        "nit-prefix",
        Category::Nitpick,
        r"(?i)^\s*(?:\*\*)?nit(?:pick)?\b|\bnit(?:pick)?\s*:",
    ),
    (
        "cosmetic",
        Category::Nitpick,
        r"(?i)\b(?:typo|spelling|whitespace|formatting|cosmetic|nitpicky|minor)\b",
    ),
    (
        "question-mark",
        Category::Question,
        r"(?m)\?\s*$",
    ),
    (
        "question-lead",
        Category::Question,
        r"(?i)^\s*(?:why|what|how|could you explain|can you explain)\b|\b(?:curious|wondering)\b",
    ),
    (
        "praise",
        Category::Praise,
        r"(?i)\b(?:lgtm|looks good|nice|great|awesome|excellent|well done|good (?:catch|call|job|work)|love (?:this|it)|thanks?|thank you)\b|👍|🎉|💯",
    ),
    (
        "suggestion",
        Category::Suggestion,
        r"(?i)```suggestion|\b(?:suggest|consider|perhaps|maybe|might want|recommend|prefer|instead)\b",
    ),
];

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    category: Category,
    regex: Regex,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, category, pattern)| Rule {
                name: (*name).to_string(),
                category: *category,
                regex: Regex::new(pattern).expect("built-in classifier pattern"),
            })
            .collect();
        Self { rules }
    }
}

impl Classifier {
    /// Built-in rules preceded by the configured extra rules.
    pub fn with_rules(extra: &[RuleSetting]) -> Result<Self> {
        let mut rules = Vec::with_capacity(extra.len() + BUILTIN_RULES.len());
        for (i, setting) in extra.iter().enumerate() {
            let category = setting.category.parse().map_err(|_| {
                AnokyeError::Config(format!(
                    "classifier rule {}: unknown category '{}'",
                    i + 1,
                    setting.category
                ))
            })?;
            let regex = Regex::new(&setting.pattern).map_err(|e| {
                AnokyeError::Config(format!("classifier rule {}: {}", i + 1, e))
            })?;
            rules.push(Rule {
                name: format!("custom-{}", i + 1),
                category,
                regex,
            });
        }
        rules.extend(Self::default().rules);
        Ok(Self { rules })
    }

    pub fn classify(&self, text: &str) -> Category {
        self.explain(text).0
    }

    /// Category together with the name of the rule that decided it.
    pub fn explain(&self, text: &str) -> (Category, Option<&str>) {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(text))
            .map_or((Category::Suggestion, None), |rule| {
                (rule.category, Some(rule.name.as_str()))
            })
    }

    /// Classify a thread by the comment that opened it.
    pub fn classify_thread(&self, thread: &ReviewThread) -> Category {
        thread
            .first_comment()
            .map_or(Category::Suggestion, |c| self.classify(&c.body))
    }

    pub fn summarize(&self, threads: &[ReviewThread]) -> ClassificationSummary {
        let mut counts: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let entries: Vec<ClassifiedThread> = threads
            .iter()
            .map(|t| {
                let category = self.classify_thread(t);
                *counts.entry(category).or_insert(0) += 1;
                ClassifiedThread {
                    id: t.id.clone(),
                    category,
                    location: t.location(),
                    author: t.author().to_string(),
                    preview: t.preview(80),
                }
            })
            .collect();
        let actionable = entries.iter().filter(|e| e.category.is_actionable()).count();

        ClassificationSummary {
            total: entries.len(),
            actionable,
            counts,
            threads: entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedThread {
    pub id: String,
    pub category: Category,
    pub location: String,
    pub author: String,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub total: usize,
    pub actionable: usize,
    pub counts: BTreeMap<Category, usize>,
    pub threads: Vec<ClassifiedThread>,
}

impl ClassificationSummary {
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn actionable_ids(&self) -> Vec<&str> {
        self.threads
            .iter()
            .filter(|t| t.category.is_actionable())
            .map(|t| t.id.as_str())
            .collect()
    }
}
