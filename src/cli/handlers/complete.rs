use crate::completion::{
    Completion, CompletionOptions, CompletionReport, Operator, Outcome, PullRequestThreads,
    StdinOperator, TimerOperator,
};
use crate::git::Git;
use crate::github::{SystemRunner, ThreadsApi};
use crate::validation::parse_issue_number;
use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use std::time::Duration;

use super::{CommandContext, EXIT_ABORTED, EXIT_ITERATION_LIMIT};

/// Parameters for the completion loop
pub struct CompleteParams {
    pub pr: String,
    pub max_iterations: Option<u32>,
    pub wait: Option<u64>,
    pub auto: Option<u64>,
    pub dry_run: bool,
    pub json: bool,
}

pub fn handle_complete(ctx: &CommandContext, params: CompleteParams) -> Result<ExitCode> {
    let number = parse_issue_number(&params.pr)?;
    let (owner, name) = ctx.repository()?;
    let client = ctx.client()?;
    let classifier = ctx.classifier()?;

    let mut options = CompletionOptions::from(&ctx.config.completion);
    if let Some(max) = params.max_iterations {
        if max == 0 {
            anyhow::bail!("--max-iterations must be at least 1");
        }
        options.max_iterations = max;
    }
    if let Some(wait) = params.wait {
        options.wait = Duration::from_secs(wait);
    }
    options.dry_run = params.dry_run;

    let source = PullRequestThreads::new(ThreadsApi::new(&client, owner, name), number);
    let workspace = Git::new(SystemRunner::in_dir(&ctx.root));
    let mut operator: Box<dyn Operator> = match params.auto {
        Some(seconds) => Box::new(TimerOperator::new(Duration::from_secs(seconds))),
        None => Box::new(StdinOperator::stdio()),
    };

    let report = Completion::new(&classifier, options).run(
        &source,
        &workspace,
        operator.as_mut(),
    )?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(number, &report);
    }

    Ok(match report.outcome {
        Outcome::Completed | Outcome::DryRun => ExitCode::SUCCESS,
        Outcome::IterationLimit => ExitCode::from(EXIT_ITERATION_LIMIT),
        Outcome::Aborted => ExitCode::from(EXIT_ABORTED),
    })
}

fn print_report(number: u64, report: &CompletionReport) {
    let outcome = match report.outcome {
        Outcome::Completed => report.outcome.to_string().green(),
        Outcome::DryRun => report.outcome.to_string().cyan(),
        Outcome::IterationLimit | Outcome::Aborted => report.outcome.to_string().yellow(),
    };
    println!(
        "{} #{}: {} after {} iteration(s)",
        "Review".bold(),
        number,
        outcome,
        report.iterations
    );
    println!(
        "  commits: {}  replied: {}  resolved: {}  remaining: {}",
        report.commits, report.replied, report.resolved, report.remaining
    );
    if report.outcome == Outcome::DryRun {
        if let Some(summary) = &report.last_summary {
            println!();
            super::utils::print_summary(summary);
        }
    }
}
