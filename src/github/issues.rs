//! Issue hierarchy retrieval: sub-issues, legacy tasklists and dependency lines.

use super::graphql::{GraphqlClient, GraphqlRequest};
use crate::error::{AnokyeError, Result};
use crate::model::{Issue, IssueState, IssueType};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, warn};

const FETCH_ISSUE: &str = r"
query Issue($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    issue(number: $number) {
      number
      title
      state
      body
      issueType { name }
      labels(first: 50) { nodes { name } }
      subIssues(first: 50) {
        nodes { number repository { nameWithOwner } }
      }
    }
  }
}";

/// `- [ ] #12`, `* [x] owner/repo#34`
static TASKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*[-*]\s+\[[ xX]\]\s+(?:([\w.-]+/[\w.-]+))?#(\d+)")
        .expect("valid tasklist pattern")
});

/// `Blocked by #3, #4` / `Depends on: #5`
static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:[-*]\s+)?(?:\*\*)?(?:blocked by|depends on)(?:\*\*)?\s*:?\s*(.+)$")
        .expect("valid dependency pattern")
});

static ISSUE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w/])#(\d+)").expect("valid issue reference pattern"));

/// Issue numbers from tasklist entries that reference `repo` (`owner/name`).
///
/// Entries naming another repository are skipped.
pub fn parse_tasklist(body: &str, repo: &str) -> Vec<u64> {
    TASKLIST_RE
        .captures_iter(body)
        .filter(|caps| {
            caps.get(1)
                .is_none_or(|r| r.as_str().eq_ignore_ascii_case(repo))
        })
        .filter_map(|caps| caps[2].parse().ok())
        .collect()
}

/// Issue numbers named on `Blocked by` / `Depends on` lines.
pub fn parse_dependencies(body: &str) -> Vec<u64> {
    let mut numbers = Vec::new();
    for caps in DEPENDENCY_RE.captures_iter(body) {
        for reference in ISSUE_REF_RE.captures_iter(&caps[1]) {
            if let Ok(n) = reference[1].parse::<u64>() {
                if !numbers.contains(&n) {
                    numbers.push(n);
                }
            }
        }
    }
    numbers
}

pub struct IssuesApi<'c> {
    client: &'c GraphqlClient,
    owner: String,
    repo: String,
}

impl<'c> IssuesApi<'c> {
    pub fn new(client: &'c GraphqlClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Fetch one issue with its children and dependencies.
    ///
    /// Children come from the sub-issue API; when that list is empty the
    /// body's tasklist is used instead.
    pub fn fetch(&self, number: u64) -> Result<Issue> {
        let request = GraphqlRequest::new(FETCH_ISSUE)
            .var("owner", self.owner.as_str())
            .var("repo", self.repo.as_str())
            .var("number", number)
            .feature("sub_issues")
            .feature("issue_types");
        let data = self.client.query(&request)?;
        let response: IssueData = serde_json::from_value(data)?;
        let node = response
            .repository
            .and_then(|r| r.issue)
            .ok_or_else(|| AnokyeError::NotFound(format!("issue {}#{}", self.slug(), number)))?;

        let slug = self.slug();
        let mut children: Vec<u64> = node
            .sub_issues
            .map(|c| c.nodes)
            .unwrap_or_default()
            .into_iter()
            .filter(|s| {
                s.repository
                    .as_ref()
                    .is_none_or(|r| r.name_with_owner.eq_ignore_ascii_case(&slug))
            })
            .map(|s| s.number)
            .collect();

        let body = node.body.unwrap_or_default();
        if children.is_empty() {
            children = parse_tasklist(&body, &slug);
            if !children.is_empty() {
                debug!(issue = number, count = children.len(), "Using legacy tasklist");
            }
        }

        let state = node.state.parse().unwrap_or_else(|_| {
            warn!(issue = number, state = %node.state, "Unknown issue state, treating as open");
            IssueState::Open
        });

        Ok(Issue {
            number: node.number,
            title: node.title,
            state,
            issue_type: node.issue_type.map(|t| IssueType::from(t.name.as_str())),
            labels: node
                .labels
                .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
                .unwrap_or_default(),
            children,
            blocked_by: parse_dependencies(&body),
            body,
        })
    }

    /// Fetch `root` and its descendants breadth-first, down to `max_depth` levels.
    ///
    /// Blockers of fetched issues are fetched too (without their children)
    /// so readiness can be computed. Every issue is requested once. Children
    /// and blockers that do not resolve to an issue (pull requests, deleted
    /// issues) are skipped; only a missing root is an error.
    pub fn fetch_tree(&self, root: u64, max_depth: usize) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([(root, 0usize)]);
        let mut blockers = Vec::new();
        seen.insert(root);

        while let Some((number, depth)) = queue.pop_front() {
            let issue = match self.fetch(number) {
                Ok(issue) => issue,
                Err(AnokyeError::NotFound(what)) if number != root => {
                    warn!(child = number, %what, "Child issue not found, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if depth < max_depth {
                for &child in &issue.children {
                    if seen.insert(child) {
                        queue.push_back((child, depth + 1));
                    }
                }
            }
            blockers.extend(issue.blocked_by.iter().copied());
            issues.push(issue);
        }

        for number in blockers {
            if seen.insert(number) {
                match self.fetch(number) {
                    Ok(issue) => issues.push(issue),
                    Err(AnokyeError::NotFound(what)) => {
                        warn!(blocker = number, %what, "Blocking issue not found");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        debug!(root, count = issues.len(), "Fetched issue tree");
        Ok(issues)
    }
}

#[derive(Debug, Deserialize)]
struct IssueData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    number: u64,
    title: String,
    state: String,
    body: Option<String>,
    issue_type: Option<NamedNode>,
    labels: Option<Connection<NamedNode>>,
    sub_issues: Option<Connection<SubIssueNode>>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SubIssueNode {
    number: u64,
    repository: Option<RepoName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoName {
    name_with_owner: String,
}
