//! Operations that go through `gh` subcommands rather than GraphQL.

use super::runner::{CommandRunner, args};
use crate::error::Result;
use crate::model::PullSummary;
use serde::Deserialize;
use tracing::info;

pub struct GhCli<R: CommandRunner> {
    runner: R,
    repo: String,
}

impl<R: CommandRunner> GhCli<R> {
    /// `repo` is `owner/name`.
    pub fn new(runner: R, repo: impl Into<String>) -> Self {
        Self {
            runner,
            repo: repo.into(),
        }
    }

    pub fn pull_summary(&self, number: u64) -> Result<PullSummary> {
        let output = self
            .runner
            .run(
                "gh",
                &[
                    "pr".to_string(),
                    "view".to_string(),
                    number.to_string(),
                    "--repo".to_string(),
                    self.repo.clone(),
                    "--json".to_string(),
                    "number,author,files,additions,deletions,labels".to_string(),
                ],
                None,
            )?
            .into_success("gh")?;
        parse_pull_view(&output)
    }

    /// Add and remove labels on an issue or pull request.
    pub fn edit_labels(&self, number: u64, add: &[String], remove: &[String]) -> Result<()> {
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }
        let mut argv = args(["issue", "edit"]);
        argv.push(number.to_string());
        argv.push("--repo".to_string());
        argv.push(self.repo.clone());
        // One flag per label: gh splits a single value on commas.
        for label in add {
            argv.push("--add-label".to_string());
            argv.push(label.clone());
        }
        for label in remove {
            argv.push("--remove-label".to_string());
            argv.push(label.clone());
        }
        self.runner.run("gh", &argv, None)?.into_success("gh")?;
        info!(issue = number, added = ?add, removed = ?remove, "Updated labels");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PullView {
    number: u64,
    author: ViewAuthor,
    #[serde(default)]
    files: Vec<ViewFile>,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    labels: Vec<ViewLabel>,
}

#[derive(Debug, Deserialize)]
struct ViewAuthor {
    login: String,
    #[serde(default)]
    is_bot: bool,
}

#[derive(Debug, Deserialize)]
struct ViewFile {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ViewLabel {
    name: String,
}

/// Parse `gh pr view --json` output. App authors (`app/name`) become `name[bot]`.
pub fn parse_pull_view(json: &str) -> Result<PullSummary> {
    let view: PullView = serde_json::from_str(json)?;
    let login = view.author.login;
    let author = if let Some(app) = login.strip_prefix("app/") {
        format!("{}[bot]", app)
    } else if view.author.is_bot && !login.ends_with("[bot]") {
        format!("{}[bot]", login)
    } else {
        login
    };
    Ok(PullSummary {
        number: view.number,
        author,
        files: view.files.into_iter().map(|f| f.path).collect(),
        additions: view.additions,
        deletions: view.deletions,
        labels: view.labels.into_iter().map(|l| l.name).collect(),
    })
}
