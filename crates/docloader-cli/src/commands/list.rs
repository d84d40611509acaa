//! List command - show ledger records.

use super::Env;
use anyhow::Result;
use colored::Colorize;

pub fn run(env: &Env, limit: i64, json: bool) -> Result<()> {
    let Some(db) = env.existing_ledger()? else {
        if json {
            println!("[]");
        } else {
            println!("{}", "No ledger yet. Run 'docloader init' or 'docloader scan'.".dimmed());
        }
        return Ok(());
    };

    let files = db.list_processed(Some(limit))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files processed yet.".dimmed());
        return Ok(());
    }

    println!("{}", "Processed Files".cyan().bold());
    println!("{}", "─".repeat(70));

    for file in &files {
        let date = file.processed_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{} {} {}",
            file.file_name.white().bold(),
            format!("[{}]", file.short_checksum()).dimmed(),
            date.dimmed()
        );
    }

    let total = db.count_processed()?;
    if total > files.len() as i64 {
        println!("{}", format!("...{} more", total - files.len() as i64).dimmed());
    }

    Ok(())
}
