use crate::allowlist::Allowlist;
use crate::approval::save_rules;
use crate::config::{AnokyeConfig, CONFIG_FILE};
use crate::error::AnokyeError;
use crate::validation::parse_repo_slug;
use anyhow::Result;
use colored::Colorize;

pub fn handle_init(repo: Option<String>, force: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    if config_path.exists() && !force {
        return Err(AnokyeError::AlreadyInitialized(config_path.display().to_string()).into());
    }

    let mut config = AnokyeConfig::default();
    if let Some(slug) = repo {
        let (owner, name) = parse_repo_slug(&slug)?;
        config.github.owner = owner;
        config.github.repo = name;
    }
    config.save(&config_path)?;

    // An empty allowlist makes the governance file visible in review.
    let allowlist_path = config.allowlist_path(&cwd);
    if !allowlist_path.exists() {
        Allowlist::default().save(&allowlist_path)?;
    }
    let rules_path = config.rules_path(&cwd);
    if !rules_path.exists() {
        save_rules(&rules_path, &[])?;
    }

    println!(
        "{} anokye project in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config:    {}", config_path.display());
    println!("  Allowlist: {}", allowlist_path.display());
    println!("  Rules:     {}", rules_path.display());
    if config.github.owner.is_empty() {
        println!(
            "\nSet {} in {} or pass {}.",
            "[github] owner/repo".cyan(),
            CONFIG_FILE,
            "--repo owner/name".cyan()
        );
    }

    Ok(())
}
