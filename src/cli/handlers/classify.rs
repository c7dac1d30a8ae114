use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::arg_or_stdin;

pub fn handle_classify(ctx: &CommandContext, text: Option<String>, json: bool) -> Result<()> {
    let text = arg_or_stdin(text)?;
    let classifier = ctx.classifier()?;
    let (category, rule) = classifier.explain(&text);

    if json {
        let result = serde_json::json!({
            "category": category,
            "actionable": category.is_actionable(),
            "rule": rule,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let actionable = if category.is_actionable() {
            "actionable".yellow()
        } else {
            "no change needed".dimmed()
        };
        println!(
            "{} ({}) {}",
            category.to_string().bold(),
            actionable,
            rule.map(|r| format!("[{}]", r)).unwrap_or_default().dimmed()
        );
    }
    Ok(())
}
