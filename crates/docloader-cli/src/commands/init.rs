//! Initialize Docloader.

use super::Env;
use anyhow::{Context, Result};
use colored::Colorize;
use docloader_config::Config;

pub fn run(env: &Env) -> Result<()> {
    let paths = &env.paths;

    if paths.is_initialized() {
        println!("{} Docloader is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Ledger: {}", paths.database_file.display());
        return Ok(());
    }

    println!("{}", "Initializing Docloader...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    if paths.config_file.exists() {
        println!("  {} Keeping config: {}", "•".dimmed(), paths.config_file.display());
    } else {
        Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
        println!("  {} Created config: {}", "✓".green(), paths.config_file.display());
    }

    let _db = env.open_ledger()?;
    println!("  {} Created ledger: {}", "✓".green(), paths.database_file.display());

    println!();
    println!("{}", "Docloader initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at a folder: {}",
        "docloader config set loader.location ~/Documents/inbox".cyan()
    );
    println!(
        "  2. Choose a backend: {}",
        "docloader config set ingest.backend command".cyan()
    );
    println!("  3. Start scanning: {}", "docloader run".cyan());

    Ok(())
}
