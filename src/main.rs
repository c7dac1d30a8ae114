use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error};

use anokye::cli::handlers::{
    CommandContext, CompleteParams, handle_agents, handle_approve_check, handle_classify,
    handle_complete, handle_graphql, handle_init, handle_issue, handle_reply, handle_resolve,
    handle_threads, handle_validate,
};
use anokye::cli::{Cli, Commands};
use anokye::logging::{self, LogOptions};

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&LogOptions {
        verbose: cli.verbose,
        format: cli.log_format.into(),
        log_file: cli.log_file.as_ref().map(PathBuf::from),
    });

    let correlation_id = cli
        .correlation_id
        .clone()
        .unwrap_or_else(logging::new_correlation_id);
    let span = logging::run_span(&correlation_id, command_name(&cli.command));
    let _guard = span.enter();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Threads { .. } => "threads",
        Commands::Classify { .. } => "classify",
        Commands::Complete { .. } => "complete",
        Commands::Reply { .. } => "reply",
        Commands::Resolve { .. } => "resolve",
        Commands::Issue { .. } => "issue",
        Commands::Agents { .. } => "agents",
        Commands::ApproveCheck { .. } => "approve-check",
        Commands::Validate { .. } => "validate",
        Commands::Graphql { .. } => "graphql",
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        command,
        config,
        repo,
        ..
    } = cli;
    let config = config.as_deref();
    let load = || CommandContext::load(config, repo.as_deref());
    debug!("Starting command");

    match command {
        Commands::Init { force } => handle_init(repo.clone(), force)?,
        Commands::Validate { kind, value } => handle_validate(kind.into(), &value)?,
        Commands::Classify { text, json } => {
            let ctx = CommandContext::load_or_default(config, repo.as_deref())?;
            handle_classify(&ctx, text, json)?;
        }
        Commands::Agents { action } => {
            let ctx = CommandContext::load_or_default(config, repo.as_deref())?;
            return handle_agents(&ctx, action);
        }
        Commands::Threads { pr, all, json } => handle_threads(&load()?, &pr, all, json)?,
        Commands::Complete {
            pr,
            max_iterations,
            wait,
            auto,
            dry_run,
            json,
        } => {
            return handle_complete(
                &load()?,
                CompleteParams {
                    pr,
                    max_iterations,
                    wait,
                    auto,
                    dry_run,
                    json,
                },
            );
        }
        Commands::Reply { thread_id, body } => handle_reply(&load()?, &thread_id, body)?,
        Commands::Resolve { pr, threads, all } => handle_resolve(&load()?, &pr, threads, all)?,
        Commands::Issue { action } => handle_issue(&load()?, action)?,
        Commands::ApproveCheck {
            pr,
            from_file,
            json,
        } => return handle_approve_check(&load()?, pr, from_file, json),
        Commands::Graphql {
            query,
            vars,
            fields,
        } => handle_graphql(&load()?, query, vars, fields)?,
    }
    Ok(ExitCode::SUCCESS)
}
