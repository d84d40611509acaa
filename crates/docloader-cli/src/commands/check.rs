//! Check command - fingerprint a file and look it up in the ledger.

use super::Env;
use anyhow::{Context, Result};
use colored::Colorize;
use docloader_ingest::fingerprint_file;
use std::path::Path;

pub fn run(env: &Env, path: &str) -> Result<()> {
    let path = Path::new(path);
    let checksum = fingerprint_file(path).context("Failed to fingerprint file")?;

    println!("{} {}", "File:".white().bold(), path.display());
    println!("{} {}", "Checksum:".white().bold(), checksum);

    let record = match env.existing_ledger()? {
        Some(db) => db.find_by_checksum(&checksum)?,
        None => None,
    };

    match record {
        Some(record) => println!(
            "{} as {} on {}",
            "Already processed".green(),
            record.file_name,
            record.processed_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("{}", "Not processed yet".yellow()),
    }

    Ok(())
}
