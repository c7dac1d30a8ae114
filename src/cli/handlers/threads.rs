use crate::github::ThreadsApi;
use crate::validation::parse_issue_number;
use anyhow::{Context, Result};
use colored::Colorize;

use super::CommandContext;
use super::utils::{arg_or_stdin, print_summary};

pub fn handle_threads(ctx: &CommandContext, pr: &str, all: bool, json: bool) -> Result<()> {
    let number = parse_issue_number(pr)?;
    let (owner, name) = ctx.repository()?;
    let client = ctx.client()?;
    let api = ThreadsApi::new(&client, owner, name);

    let threads = if all {
        api.list(number)?
    } else {
        api.list_unresolved(number)?
    };
    let summary = ctx.classifier()?.summarize(&threads);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

pub fn handle_reply(ctx: &CommandContext, thread_id: &str, body: String) -> Result<()> {
    let body = arg_or_stdin(Some(body))?;
    if body.is_empty() {
        anyhow::bail!("Reply body cannot be empty");
    }
    let (owner, name) = ctx.repository()?;
    let client = ctx.client()?;
    let url = ThreadsApi::new(&client, owner, name)
        .reply(thread_id, &body)
        .with_context(|| format!("Failed to reply to thread {}", thread_id))?;

    println!("{} {} {}", "Replied".green(), thread_id.cyan(), url.dimmed());
    Ok(())
}

pub fn handle_resolve(
    ctx: &CommandContext,
    pr: &str,
    threads: Vec<String>,
    all: bool,
) -> Result<()> {
    let number = parse_issue_number(pr)?;
    let (owner, name) = ctx.repository()?;
    let client = ctx.client()?;
    let api = ThreadsApi::new(&client, owner, name);

    let ids = if all {
        api.list_unresolved(number)?
            .into_iter()
            .map(|t| t.id)
            .collect()
    } else {
        threads
    };
    if ids.is_empty() {
        println!("Nothing to resolve.");
        return Ok(());
    }

    let mut failed = 0;
    for id in &ids {
        if api.resolve(id)? {
            println!("{} {}", "Resolved".green(), id.cyan());
        } else {
            failed += 1;
            println!("{} {}", "Not resolved".yellow(), id.cyan());
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} thread(s) did not resolve", failed, ids.len());
    }
    Ok(())
}
