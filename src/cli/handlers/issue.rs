use crate::cli::IssueAction;
use crate::dag::IssueGraph;
use crate::github::{GhCli, IssuesApi, SystemRunner};
use crate::validation::parse_issue_number;
use anyhow::{Context, Result};
use colored::Colorize;

use super::CommandContext;
use super::utils::{format_progress, print_tree};

pub fn handle_issue(ctx: &CommandContext, action: IssueAction) -> Result<()> {
    match action {
        IssueAction::Tree {
            number,
            depth,
            json,
        } => {
            let root = parse_issue_number(&number)?;
            let graph = fetch_graph(ctx, root, depth)?;
            let report = graph.report(root)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_tree(&report.tree, 0);
                println!(
                    "\n{} of {} leaf issue(s) closed {}",
                    report.progress.closed,
                    report.progress.total,
                    format_progress(&report.progress)
                );
                if !report.cycle.is_empty() {
                    println!(
                        "{} dependency cycle between {}",
                        "Warning:".yellow(),
                        join_numbers(&report.cycle)
                    );
                }
            }
            Ok(())
        }
        IssueAction::Ready {
            number,
            depth,
            json,
        } => {
            let root = parse_issue_number(&number)?;
            let graph = fetch_graph(ctx, root, depth)?;
            let scope = graph.descendants(root);
            let ready: Vec<_> = graph
                .ready()
                .into_iter()
                .filter(|i| scope.contains(&i.number))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&ready)?);
            } else if ready.is_empty() {
                println!("No ready issues under #{}.", root);
            } else {
                for issue in ready {
                    println!("{} {}", format!("#{}", issue.number).cyan(), issue.title);
                }
            }
            Ok(())
        }
        IssueAction::Blocked {
            number,
            depth,
            json,
        } => {
            let root = parse_issue_number(&number)?;
            let graph = fetch_graph(ctx, root, depth)?;
            let scope = graph.descendants(root);
            let blocked: Vec<_> = graph
                .blocked()
                .into_iter()
                .filter(|b| scope.contains(&b.number))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&blocked)?);
            } else if blocked.is_empty() {
                println!("No blocked issues under #{}.", root);
            } else {
                for issue in blocked {
                    println!(
                        "{} {} {} {}",
                        format!("#{}", issue.number).cyan(),
                        issue.title,
                        "blocked by".dimmed(),
                        join_numbers(&issue.blockers).red()
                    );
                }
            }
            Ok(())
        }
        IssueAction::Label {
            number,
            add,
            remove,
        } => {
            let number = parse_issue_number(&number)?;
            if add.is_empty() && remove.is_empty() {
                anyhow::bail!("Nothing to do: pass --add and/or --remove");
            }
            let gh = GhCli::new(SystemRunner::new(), ctx.slug()?);
            gh.edit_labels(number, &add, &remove)
                .with_context(|| format!("Failed to update labels on #{}", number))?;
            println!("{} #{}", "Updated labels on".green(), number);
            Ok(())
        }
    }
}

fn fetch_graph(ctx: &CommandContext, root: u64, depth: usize) -> Result<IssueGraph> {
    let (owner, name) = ctx.repository()?;
    let client = ctx.client()?;
    let issues = IssuesApi::new(&client, owner, name)
        .fetch_tree(root, depth)
        .with_context(|| format!("Failed to fetch issue hierarchy under #{}", root))?;
    Ok(IssueGraph::new(issues))
}

fn join_numbers(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(|n| format!("#{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}
