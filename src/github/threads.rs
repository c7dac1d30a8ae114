//! Pull-request review threads: list, reply, resolve.

use super::graphql::{GraphqlClient, GraphqlRequest};
use crate::error::{AnokyeError, Result};
use crate::model::{ReviewThread, ThreadComment};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const LIST_THREADS: &str = r"
query ReviewThreads($owner: String!, $repo: String!, $number: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviewThreads(first: 100, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          isResolved
          isOutdated
          path
          line
          comments(first: 50) {
            nodes { id body url author { login } }
          }
        }
      }
    }
  }
}";

const REPLY_TO_THREAD: &str = r"
mutation ReplyToThread($threadId: ID!, $body: String!) {
  addPullRequestReviewThreadReply(input: {pullRequestReviewThreadId: $threadId, body: $body}) {
    comment { id url }
  }
}";

const RESOLVE_THREAD: &str = r"
mutation ResolveThread($threadId: ID!) {
  resolveReviewThread(input: {threadId: $threadId}) {
    thread { id isResolved }
  }
}";

/// Review-thread operations on one repository.
pub struct ThreadsApi<'c> {
    client: &'c GraphqlClient,
    owner: String,
    repo: String,
}

impl<'c> ThreadsApi<'c> {
    pub fn new(client: &'c GraphqlClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// All review threads on a pull request, following pagination.
    pub fn list(&self, pr_number: u64) -> Result<Vec<ReviewThread>> {
        let mut threads = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = GraphqlRequest::new(LIST_THREADS)
                .var("owner", self.owner.as_str())
                .var("repo", self.repo.as_str())
                .var("number", pr_number)
                .var("cursor", cursor.clone().map_or(Value::Null, Value::String));
            let data = self.client.query(&request)?;
            let response: ThreadsData = serde_json::from_value(data)?;

            let connection = response
                .repository
                .and_then(|r| r.pull_request)
                .ok_or_else(|| {
                    AnokyeError::NotFound(format!(
                        "pull request {}/{}#{}",
                        self.owner, self.repo, pr_number
                    ))
                })?
                .review_threads;

            threads.extend(connection.nodes.into_iter().map(ReviewThread::from));

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(next),
                } => cursor = Some(next),
                _ => break,
            }
        }

        debug!(pr = pr_number, count = threads.len(), "Fetched review threads");
        Ok(threads)
    }

    pub fn list_unresolved(&self, pr_number: u64) -> Result<Vec<ReviewThread>> {
        let all = self.list(pr_number)?;
        Ok(all.into_iter().filter(|t| !t.is_resolved).collect())
    }

    /// Post `body` as a reply in the thread; returns the new comment's URL.
    pub fn reply(&self, thread_id: &str, body: &str) -> Result<String> {
        let request = GraphqlRequest::new(REPLY_TO_THREAD)
            .var("threadId", thread_id)
            .var("body", body);
        let data = self.client.query(&request)?;
        let url = data
            .pointer("/addPullRequestReviewThreadReply/comment/url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!(thread_id, "Replied to thread");
        Ok(url)
    }

    /// Mark the thread resolved; returns whether GitHub reports it resolved.
    pub fn resolve(&self, thread_id: &str) -> Result<bool> {
        let request = GraphqlRequest::new(RESOLVE_THREAD).var("threadId", thread_id);
        let data = self.client.query(&request)?;
        let resolved = data
            .pointer("/resolveReviewThread/thread/isResolved")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        info!(thread_id, resolved, "Resolved thread");
        Ok(resolved)
    }
}

#[derive(Debug, Deserialize)]
struct ThreadsData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    review_threads: ThreadConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadConnection {
    page_info: PageInfo,
    nodes: Vec<ThreadNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub(crate) has_next_page: bool,
    pub(crate) end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadNode {
    id: String,
    is_resolved: bool,
    #[serde(default)]
    is_outdated: bool,
    path: Option<String>,
    line: Option<u32>,
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct CommentConnection {
    nodes: Vec<CommentNode>,
}

#[derive(Debug, Deserialize)]
struct CommentNode {
    id: String,
    body: String,
    #[serde(default)]
    url: String,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Author {
    pub(crate) login: String,
}

impl From<ThreadNode> for ReviewThread {
    fn from(node: ThreadNode) -> Self {
        ReviewThread {
            id: node.id,
            is_resolved: node.is_resolved,
            is_outdated: node.is_outdated,
            path: node.path,
            line: node.line,
            comments: node
                .comments
                .nodes
                .into_iter()
                .map(|c| ThreadComment {
                    id: c.id,
                    author: c.author.map(|a| a.login).unwrap_or_default(),
                    body: c.body,
                    url: c.url,
                })
                .collect(),
        }
    }
}
