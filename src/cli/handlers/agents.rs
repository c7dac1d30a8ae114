use crate::allowlist::{AgentKind, Allowlist, ApprovedAgent};
use crate::cli::AgentsAction;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;

use super::CommandContext;

pub fn handle_agents(ctx: &CommandContext, action: AgentsAction) -> Result<ExitCode> {
    let path = ctx.allowlist_path();
    let mut allowlist = Allowlist::load(&path)
        .with_context(|| format!("Failed to read allowlist {}", path.display()))?;

    match action {
        AgentsAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&allowlist)?);
            } else if allowlist.agents.is_empty() {
                println!("No approved agents.");
            } else {
                for agent in &allowlist.agents {
                    let scopes = if agent.scopes.is_empty() {
                        "*".to_string()
                    } else {
                        agent.scopes.join(",")
                    };
                    println!(
                        "{} [{}] scopes={} approved by {} on {}",
                        agent.username.cyan(),
                        agent.kind.to_string().blue(),
                        scopes,
                        agent.approved_by,
                        agent.approved_at.format("%Y-%m-%d")
                    );
                }
            }
        }
        AgentsAction::Add {
            username,
            kind,
            app_id,
            approved_by,
            scopes,
            notes,
        } => {
            let mut agent = ApprovedAgent::new(username, approved_by);
            if let Some(kind) = kind {
                agent.kind = AgentKind::from(kind);
            }
            agent.app_id = app_id;
            agent.scopes = scopes;
            agent.notes = notes;

            let name = agent.username.clone();
            allowlist.add(agent)?;
            allowlist.save(&path)?;
            println!("{} {}", "Approved".green(), name.cyan());
        }
        AgentsAction::Remove { username } => {
            let removed = allowlist.remove(&username)?;
            allowlist.save(&path)?;
            println!("{} {}", "Revoked".yellow(), removed.username.cyan());
        }
        AgentsAction::Check { username } => {
            return Ok(match allowlist.find(&username) {
                Some(agent) => {
                    println!("{} {} is approved", "✓".green(), agent.username.cyan());
                    ExitCode::SUCCESS
                }
                None => {
                    println!("{} {} is not approved", "✗".red(), username.cyan());
                    ExitCode::FAILURE
                }
            });
        }
    }
    Ok(ExitCode::SUCCESS)
}
