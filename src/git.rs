use crate::error::Result;
use crate::github::runner::{CommandRunner, args};
use tracing::{debug, info};

/// Thin wrapper over the `git` CLI. The runner decides the working directory.
pub struct Git<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn git(&self, argv: Vec<String>) -> Result<String> {
        self.runner.run("git", &argv, None)?.into_success("git")
    }

    /// True when `git status --porcelain` reports anything.
    pub fn has_changes(&self) -> Result<bool> {
        let status = self.git(args(["status", "--porcelain"]))?;
        let changed = status.lines().filter(|l| !l.trim().is_empty()).count();
        debug!(changed, "Checked working tree");
        Ok(changed > 0)
    }

    pub fn add_all(&self) -> Result<()> {
        self.git(args(["add", "--all"]))?;
        Ok(())
    }

    /// Commit staged changes and return the new HEAD sha.
    pub fn commit(&self, message: &str) -> Result<String> {
        self.git(args(["commit", "-m", message]))?;
        let sha = self.head_sha()?;
        info!(%sha, "Committed changes");
        Ok(sha)
    }

    /// Push the current branch to `remote`.
    pub fn push(&self, remote: &str) -> Result<()> {
        let branch = self.current_branch()?;
        self.git(args(["push", remote, branch.as_str()]))?;
        info!(remote, %branch, "Pushed branch");
        Ok(())
    }

    pub fn head_sha(&self) -> Result<String> {
        Ok(self.git(args(["rev-parse", "HEAD"]))?.trim().to_string())
    }

    pub fn current_branch(&self) -> Result<String> {
        Ok(self
            .git(args(["rev-parse", "--abbrev-ref", "HEAD"]))?
            .trim()
            .to_string())
    }
}
