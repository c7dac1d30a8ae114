use crate::classify::{Category, ClassificationSummary};
use crate::dag::{Progress, TreeNode};
use crate::model::IssueState;
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Read};

/// Use `value` as given, or read all of stdin when it is absent or `-`.
pub fn arg_or_stdin(value: Option<String>) -> Result<String> {
    match value {
        Some(v) if v != "-" => Ok(v),
        _ => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Ok(content.trim().to_string())
        }
    }
}

pub fn format_category(category: Category) -> colored::ColoredString {
    let label = format!("{:<10}", category.to_string());
    match category {
        Category::Blocking => label.red().bold(),
        Category::Suggestion => label.yellow(),
        Category::Nitpick => label.blue(),
        Category::Question => label.magenta(),
        Category::Praise => label.green(),
    }
}

pub fn format_state(state: IssueState) -> colored::ColoredString {
    match state {
        IssueState::Open => "open".white(),
        IssueState::Closed => "closed".green(),
    }
}

pub fn format_progress(progress: &Progress) -> colored::ColoredString {
    let text = format!("{:>5.1}%", progress.percent);
    if progress.total > 0 && progress.closed == progress.total {
        text.green()
    } else if progress.closed == 0 {
        text.dimmed()
    } else {
        text.yellow()
    }
}

pub fn print_summary(summary: &ClassificationSummary) {
    if summary.threads.is_empty() {
        println!("No review threads found.");
        return;
    }

    for thread in &summary.threads {
        println!(
            "{} {} {} {}",
            format_category(thread.category),
            thread.location.cyan(),
            format!("@{}", thread.author).dimmed(),
            thread.preview
        );
        println!("           {}", thread.id.dimmed());
    }

    let counts: Vec<String> = Category::ALL
        .iter()
        .filter_map(|&c| match summary.count(c) {
            0 => None,
            n => Some(format!("{} {}", n, c)),
        })
        .collect();
    println!(
        "\n{} thread(s), {} actionable ({})",
        summary.total,
        summary.actionable,
        counts.join(", ")
    );
}

pub fn print_tree(node: &TreeNode, depth: usize) {
    let kind = node
        .issue_type
        .as_ref()
        .map(|t| format!("[{}] ", t))
        .unwrap_or_default();
    // Leaf tasks only show their state.
    let tracks_progress =
        !node.children.is_empty() || node.issue_type.as_ref().is_some_and(|t| t.is_container());
    let progress = if tracks_progress {
        format!(" {}", format_progress(&node.progress))
    } else {
        String::new()
    };
    println!(
        "{}{} {} {}{}{}",
        "  ".repeat(depth),
        format!("#{}", node.number).cyan(),
        format_state(node.state),
        kind.blue(),
        node.title,
        progress
    );
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}
