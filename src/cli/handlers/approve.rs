use crate::allowlist::Allowlist;
use crate::approval::{evaluate, load_rules};
use crate::github::cli::parse_pull_view;
use crate::github::{GhCli, SystemRunner};
use crate::validation::parse_issue_number;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;

use super::CommandContext;

pub fn handle_approve_check(
    ctx: &CommandContext,
    pr: Option<String>,
    from_file: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let summary = match (from_file, pr) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path))?;
            parse_pull_view(&content).with_context(|| format!("Failed to parse {}", path))?
        }
        (None, Some(pr)) => {
            let number = parse_issue_number(&pr)?;
            GhCli::new(SystemRunner::new(), ctx.slug()?).pull_summary(number)?
        }
        (None, None) => anyhow::bail!("Pass a pull request number or --from-file"),
    };

    let allowlist = Allowlist::load(&ctx.allowlist_path())?;
    let rules_path = ctx.rules_path();
    let rules = load_rules(&rules_path)
        .with_context(|| format!("Failed to read rules {}", rules_path.display()))?;
    let decision = evaluate(&rules, &allowlist, &summary);

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else if decision.approved {
        println!(
            "{} #{} by {} (rule {})",
            "Auto-approve".green(),
            summary.number,
            summary.author.cyan(),
            decision.rule.as_deref().unwrap_or_default()
        );
    } else {
        println!(
            "{} #{} by {}",
            "Needs human review".yellow(),
            summary.number,
            summary.author.cyan()
        );
        for reason in &decision.reasons {
            println!("  - {}", reason);
        }
    }

    Ok(if decision.approved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
