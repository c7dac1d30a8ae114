//! The PR-completion loop.
//!
//! Each iteration fetches unresolved review threads, classifies them, hands
//! control to an [`Operator`] that edits the working tree, then commits,
//! pushes, replies to and resolves the actionable threads. The loop ends
//! when no unresolved threads remain, the operator aborts, or the
//! iteration cap is reached.

use crate::classify::{ClassificationSummary, Classifier};
use crate::config::CompletionSettings;
use crate::error::Result;
use crate::git::Git;
use crate::github::runner::CommandRunner;
use crate::github::ThreadsApi;
use crate::model::ReviewThread;
use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{debug, info, info_span, warn};

/// Where review threads come from and where replies go.
pub trait ReviewSource {
    fn unresolved(&self) -> Result<Vec<ReviewThread>>;
    fn reply(&self, thread_id: &str, body: &str) -> Result<()>;
    fn resolve(&self, thread_id: &str) -> Result<bool>;
}

/// The working tree the operator edits.
pub trait Workspace {
    fn has_changes(&self) -> Result<bool>;
    /// Stage everything and commit; returns the new commit sha.
    fn commit_all(&self, message: &str) -> Result<String>;
    fn push(&self, remote: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAction {
    /// Edits are done; commit and answer the threads.
    Continue,
    /// Nothing to commit this round.
    Skip,
    Abort,
}

/// Whoever makes the code changes between fetching and committing.
pub trait Operator {
    fn await_edits(
        &mut self,
        iteration: u32,
        summary: &ClassificationSummary,
    ) -> Result<OperatorAction>;
}

/// Interactive operator: prints the threads and waits for one line of input.
///
/// `q` aborts, `s` skips the commit step, anything else continues.
/// End of input aborts.
pub struct StdinOperator<I, O> {
    input: I,
    output: O,
}

impl StdinOperator<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr so stdout carries only the final report.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<I: BufRead, O: Write> StdinOperator<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl<I: BufRead, O: Write> Operator for StdinOperator<I, O> {
    fn await_edits(
        &mut self,
        iteration: u32,
        summary: &ClassificationSummary,
    ) -> Result<OperatorAction> {
        writeln!(
            self.output,
            "{} {} unresolved thread(s), {} actionable",
            format!("[iteration {}]", iteration).bold(),
            summary.total,
            summary.actionable
        )?;
        for thread in &summary.threads {
            let marker = if thread.category.is_actionable() {
                "*".yellow()
            } else {
                " ".normal()
            };
            writeln!(
                self.output,
                "  {} {:<10} {} {}",
                marker,
                thread.category.to_string(),
                thread.location.cyan(),
                thread.preview.dimmed()
            )?;
        }
        write!(
            self.output,
            "Edit the files, then press Enter to commit ([s]kip, [q]uit): "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(OperatorAction::Abort);
        }
        Ok(match line.trim().to_lowercase().as_str() {
            "q" | "quit" | "abort" => OperatorAction::Abort,
            "s" | "skip" => OperatorAction::Skip,
            _ => OperatorAction::Continue,
        })
    }
}

/// Non-interactive operator: gives an agent a fixed amount of time per round.
pub struct TimerOperator {
    delay: Duration,
    sleeper: Box<dyn Fn(Duration)>,
}

impl TimerOperator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }
}

impl Operator for TimerOperator {
    fn await_edits(
        &mut self,
        iteration: u32,
        summary: &ClassificationSummary,
    ) -> Result<OperatorAction> {
        info!(
            iteration,
            actionable = summary.actionable,
            seconds = self.delay.as_secs(),
            "Waiting for edits"
        );
        (self.sleeper)(self.delay);
        Ok(OperatorAction::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No unresolved threads remain.
    Completed,
    IterationLimit,
    Aborted,
    /// Classified only; nothing was changed.
    DryRun,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::IterationLimit => write!(f, "iteration limit reached"),
            Outcome::Aborted => write!(f, "aborted"),
            Outcome::DryRun => write!(f, "dry run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub outcome: Outcome,
    pub iterations: u32,
    pub commits: u32,
    pub replied: u32,
    pub resolved: u32,
    /// Unresolved threads known when the loop stopped.
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_summary: Option<ClassificationSummary>,
}

impl CompletionReport {
    fn new() -> Self {
        Self {
            outcome: Outcome::IterationLimit,
            iterations: 0,
            commits: 0,
            replied: 0,
            resolved: 0,
            remaining: 0,
            last_summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub max_iterations: u32,
    /// Pause between iterations.
    pub wait: Duration,
    pub commit_message: String,
    /// Reply body; `{sha}` and `{short_sha}` are substituted.
    pub reply_template: String,
    pub remote: String,
    pub dry_run: bool,
}

impl From<&CompletionSettings> for CompletionOptions {
    fn from(settings: &CompletionSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            wait: settings.wait(),
            commit_message: settings.commit_message.clone(),
            reply_template: settings.reply_template.clone(),
            remote: settings.remote.clone(),
            dry_run: false,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::from(&CompletionSettings::default())
    }
}

pub fn render_reply(template: &str, sha: &str) -> String {
    let short: String = sha.chars().take(7).collect();
    template
        .replace("{short_sha}", &short)
        .replace("{sha}", sha)
}

pub struct Completion<'a> {
    classifier: &'a Classifier,
    options: CompletionOptions,
    sleeper: Box<dyn Fn(Duration) + 'a>,
}

impl<'a> Completion<'a> {
    pub fn new(classifier: &'a Classifier, options: CompletionOptions) -> Self {
        Self {
            classifier,
            options,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn run(
        &self,
        source: &dyn ReviewSource,
        workspace: &dyn Workspace,
        operator: &mut dyn Operator,
    ) -> Result<CompletionReport> {
        let mut report = CompletionReport::new();
        let max = self.options.max_iterations;

        for iteration in 1..=max {
            let span = info_span!("iteration", iteration);
            let _guard = span.enter();
            report.iterations = iteration;

            let threads = source.unresolved()?;
            if threads.is_empty() {
                info!("No unresolved threads");
                report.outcome = Outcome::Completed;
                report.remaining = 0;
                return Ok(report);
            }

            let summary = self.classifier.summarize(&threads);
            info!(
                total = summary.total,
                actionable = summary.actionable,
                "Classified unresolved threads"
            );
            report.remaining = summary.total;

            if self.options.dry_run {
                report.outcome = Outcome::DryRun;
                report.last_summary = Some(summary);
                return Ok(report);
            }

            match operator.await_edits(iteration, &summary)? {
                OperatorAction::Abort => {
                    info!("Operator aborted");
                    report.outcome = Outcome::Aborted;
                    report.last_summary = Some(summary);
                    return Ok(report);
                }
                OperatorAction::Skip => debug!("Operator skipped commit step"),
                OperatorAction::Continue => {
                    let resolved = self.apply(&summary, source, workspace, &mut report)?;
                    report.remaining = summary.total.saturating_sub(resolved);
                }
            }
            report.last_summary = Some(summary);

            if report.remaining == 0 {
                info!("All threads resolved");
                report.outcome = Outcome::Completed;
                return Ok(report);
            }
            if iteration < max && !self.options.wait.is_zero() {
                debug!(seconds = self.options.wait.as_secs(), "Waiting before next iteration");
                (self.sleeper)(self.options.wait);
            }
        }

        warn!(max_iterations = max, remaining = report.remaining, "Iteration limit reached");
        report.outcome = Outcome::IterationLimit;
        Ok(report)
    }

    /// Commit, push, and answer actionable threads. Returns how many were resolved.
    fn apply(
        &self,
        summary: &ClassificationSummary,
        source: &dyn ReviewSource,
        workspace: &dyn Workspace,
        report: &mut CompletionReport,
    ) -> Result<usize> {
        if !workspace.has_changes()? {
            warn!("No changes in working tree; threads left open");
            return Ok(0);
        }

        let sha = workspace.commit_all(&self.options.commit_message)?;
        workspace.push(&self.options.remote)?;
        report.commits += 1;

        let body = render_reply(&self.options.reply_template, &sha);
        let mut resolved = 0;
        for thread_id in summary.actionable_ids() {
            source.reply(thread_id, &body)?;
            report.replied += 1;
            if source.resolve(thread_id)? {
                resolved += 1;
                report.resolved += 1;
            } else {
                warn!(thread_id, "Thread did not report resolved");
            }
        }
        info!(%sha, resolved, "Answered review threads");
        Ok(resolved)
    }
}

/// Review threads of one pull request.
pub struct PullRequestThreads<'c> {
    api: ThreadsApi<'c>,
    number: u64,
}

impl<'c> PullRequestThreads<'c> {
    pub fn new(api: ThreadsApi<'c>, number: u64) -> Self {
        Self { api, number }
    }
}

impl ReviewSource for PullRequestThreads<'_> {
    fn unresolved(&self) -> Result<Vec<ReviewThread>> {
        self.api.list_unresolved(self.number)
    }

    fn reply(&self, thread_id: &str, body: &str) -> Result<()> {
        self.api.reply(thread_id, body).map(|_| ())
    }

    fn resolve(&self, thread_id: &str) -> Result<bool> {
        self.api.resolve(thread_id)
    }
}

impl<R: CommandRunner> Workspace for Git<R> {
    fn has_changes(&self) -> Result<bool> {
        Git::has_changes(self)
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        self.add_all()?;
        self.commit(message)
    }

    fn push(&self, remote: &str) -> Result<()> {
        Git::push(self, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThreadComment;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    fn thread(id: &str, body: &str) -> ReviewThread {
        ReviewThread {
            id: id.into(),
            is_resolved: false,
            is_outdated: false,
            path: Some("src/lib.rs".into()),
            line: Some(1),
            comments: vec![ThreadComment {
                id: format!("c-{id}"),
                author: "reviewer".into(),
                body: body.into(),
                url: String::new(),
            }],
        }
    }

    #[derive(Default)]
    struct FakeSource {
        rounds: RefCell<VecDeque<Vec<ReviewThread>>>,
        replies: RefCell<Vec<(String, String)>>,
        resolved: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn with_rounds(rounds: Vec<Vec<ReviewThread>>) -> Self {
            Self {
                rounds: RefCell::new(rounds.into()),
                ..Default::default()
            }
        }
    }

    impl ReviewSource for FakeSource {
        fn unresolved(&self) -> Result<Vec<ReviewThread>> {
            Ok(self.rounds.borrow_mut().pop_front().unwrap_or_default())
        }

        fn reply(&self, thread_id: &str, body: &str) -> Result<()> {
            self.replies
                .borrow_mut()
                .push((thread_id.to_string(), body.to_string()));
            Ok(())
        }

        fn resolve(&self, thread_id: &str) -> Result<bool> {
            self.resolved.borrow_mut().push(thread_id.to_string());
            Ok(true)
        }
    }

    struct FakeWorkspace {
        dirty: bool,
        commits: Cell<u32>,
        pushes: Cell<u32>,
    }

    impl FakeWorkspace {
        fn new(dirty: bool) -> Self {
            Self {
                dirty,
                commits: Cell::new(0),
                pushes: Cell::new(0),
            }
        }
    }

    impl Workspace for FakeWorkspace {
        fn has_changes(&self) -> Result<bool> {
            Ok(self.dirty)
        }

        fn commit_all(&self, _message: &str) -> Result<String> {
            self.commits.set(self.commits.get() + 1);
            Ok("0123456789abcdef".into())
        }

        fn push(&self, _remote: &str) -> Result<()> {
            self.pushes.set(self.pushes.get() + 1);
            Ok(())
        }
    }

    struct Scripted(VecDeque<OperatorAction>);

    impl Operator for Scripted {
        fn await_edits(&mut self, _: u32, _: &ClassificationSummary) -> Result<OperatorAction> {
            Ok(self.0.pop_front().unwrap_or(OperatorAction::Continue))
        }
    }

    fn options(max_iterations: u32) -> CompletionOptions {
        CompletionOptions {
            max_iterations,
            wait: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_completes_when_nothing_unresolved() {
        let classifier = Classifier::default();
        let source = FakeSource::with_rounds(vec![vec![]]);
        let workspace = FakeWorkspace::new(true);
        let mut operator = Scripted(VecDeque::new());

        let report = Completion::new(&classifier, options(3))
            .with_sleeper(|_| panic!("no wait expected"))
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.iterations, 1);
        assert_eq!(workspace.commits.get(), 0);
    }

    #[test]
    fn test_resolves_only_actionable_threads() {
        let classifier = Classifier::default();
        let source = FakeSource::with_rounds(vec![
            vec![thread("T1", "This is broken"), thread("T2", "Why is this here?")],
            vec![thread("T2", "Why is this here?")],
        ]);
        let workspace = FakeWorkspace::new(true);
        let mut operator = Scripted(VecDeque::new());
        let waits = Cell::new(0);

        let report = Completion::new(&classifier, options(2))
            .with_sleeper(|_| waits.set(waits.get() + 1))
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::IterationLimit);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.commits, 2);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.remaining, 1);
        assert_eq!(*source.resolved.borrow(), vec!["T1"]);
        assert_eq!(
            source.replies.borrow()[0],
            ("T1".to_string(), "Addressed in 0123456789abcdef.".to_string())
        );
        // Only between iterations.
        assert_eq!(waits.get(), 1);
    }

    #[test]
    fn test_stops_once_everything_resolved() {
        let classifier = Classifier::default();
        let source = FakeSource::with_rounds(vec![vec![thread("T1", "nit: spacing")]]);
        let workspace = FakeWorkspace::new(true);
        let mut operator = Scripted(VecDeque::new());

        let report = Completion::new(&classifier, options(5))
            .with_sleeper(|_| panic!("no wait expected"))
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.iterations, 1);
        assert_eq!(workspace.pushes.get(), 1);
    }

    #[test]
    fn test_clean_tree_commits_nothing() {
        let classifier = Classifier::default();
        let source = FakeSource::with_rounds(vec![vec![thread("T1", "must fix")]]);
        let workspace = FakeWorkspace::new(false);
        let mut operator = Scripted(VecDeque::new());

        let report = Completion::new(&classifier, options(1))
            .with_sleeper(|_| {})
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::IterationLimit);
        assert_eq!(report.commits, 0);
        assert!(source.replies.borrow().is_empty());
        assert!(source.resolved.borrow().is_empty());
    }

    #[test]
    fn test_abort_and_skip() {
        let classifier = Classifier::default();
        let round = || vec![thread("T1", "must fix")];
        let source = FakeSource::with_rounds(vec![round(), round()]);
        let workspace = FakeWorkspace::new(true);
        let mut operator = Scripted(VecDeque::from([OperatorAction::Skip, OperatorAction::Abort]));

        let report = Completion::new(&classifier, options(5))
            .with_sleeper(|_| {})
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::Aborted);
        assert_eq!(report.iterations, 2);
        assert_eq!(workspace.commits.get(), 0);
    }

    #[test]
    fn test_dry_run_never_mutates() {
        let classifier = Classifier::default();
        let source = FakeSource::with_rounds(vec![vec![thread("T1", "must fix")]]);
        let workspace = FakeWorkspace::new(true);
        let mut operator = Scripted(VecDeque::new());
        let mut opts = options(3);
        opts.dry_run = true;

        let report = Completion::new(&classifier, opts)
            .run(&source, &workspace, &mut operator)
            .unwrap();

        assert_eq!(report.outcome, Outcome::DryRun);
        assert_eq!(report.remaining, 1);
        assert_eq!(workspace.commits.get(), 0);
        assert!(source.replies.borrow().is_empty());
        assert_eq!(report.last_summary.unwrap().actionable, 1);
    }

    #[test]
    fn test_stdin_operator_parses_input() {
        let summary = Classifier::default().summarize(&[thread("T1", "must fix")]);
        let cases = [
            ("\n", OperatorAction::Continue),
            ("s\n", OperatorAction::Skip),
            ("Q\n", OperatorAction::Abort),
            ("", OperatorAction::Abort),
        ];
        for (input, expected) in cases {
            let mut out = Vec::new();
            let mut operator = StdinOperator::new(input.as_bytes(), &mut out);
            assert_eq!(operator.await_edits(1, &summary).unwrap(), expected);
            let printed = String::from_utf8(out).unwrap();
            assert!(printed.contains("src/lib.rs:1"));
        }
    }

    #[test]
    fn test_timer_operator_sleeps() {
        let slept = std::rc::Rc::new(Cell::new(Duration::ZERO));
        let recorder = slept.clone();
        let mut operator =
            TimerOperator::new(Duration::from_secs(90)).with_sleeper(move |d| recorder.set(d));
        let summary = Classifier::default().summarize(&[]);
        assert_eq!(
            operator.await_edits(1, &summary).unwrap(),
            OperatorAction::Continue
        );
        assert_eq!(slept.get(), Duration::from_secs(90));
    }

    #[test]
    fn test_render_reply() {
        assert_eq!(
            render_reply("Fixed in {short_sha} ({sha})", "abcdef0123"),
            "Fixed in abcdef0 (abcdef0123)"
        );
    }
}
