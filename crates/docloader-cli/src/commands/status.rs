//! Status command - configuration, watched folder and ledger overview.

use super::{format_size, Env};
use anyhow::Result;
use colored::Colorize;
use docloader_config::IngestBackend;
use docloader_ingest::Scanner;

pub fn run(env: &Env) -> Result<()> {
    let config = &env.config;

    println!("{}", "Docloader Status".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Watched Folder".white().bold());
    match config.loader.resolved_location() {
        Ok(dir) => {
            let pending = Scanner::from_config(&config.loader).ok().and_then(|scanner| {
                let scan = scanner.scan(&dir).ok()?;
                Some(scan.filter(Result::is_ok).count())
            });
            match pending {
                Some(count) => println!("  {} {} ({} files)", "+".green(), dir.display(), count),
                None => println!("  {} {} (not accessible)", "-".red(), dir.display()),
            }
        }
        Err(e) => println!("  {} {} ({})", "-".red(), config.loader.location, e),
    }
    println!(
        "  Scan every {}s, first after {}s",
        config.loader.period_seconds, config.loader.delay_seconds
    );
    match config.loader.file_timeout() {
        Some(t) => println!("  Per-file timeout: {}s", t.as_secs()),
        None => println!("  Per-file timeout: none"),
    }
    println!("  Parallel files: {}", config.loader.max_concurrent_files);
    if !config.loader.include_patterns.is_empty() {
        println!("  Include: {}", config.loader.include_patterns.join(", "));
    }
    if !config.loader.ignore_patterns.is_empty() {
        println!("  Ignore: {}", config.loader.ignore_patterns.join(", "));
    }

    println!();
    println!("{}", "Ingestion".white().bold());
    println!("  Backend: {}", config.ingest.backend);
    match config.ingest.backend {
        IngestBackend::Command => {
            println!("  Command: {} {}", config.ingest.command, config.ingest.args.join(" "))
        }
        IngestBackend::Http => println!("  Endpoint: {}", config.ingest.endpoint),
        IngestBackend::Log => {}
    }
    if let Err(e) = config.validate() {
        println!("  {} {}", "✗".red(), e);
    }

    println!();
    println!("{}", "Ledger".white().bold());
    println!("  Path: {}", env.paths.database_file.display());
    match env.existing_ledger()? {
        Some(db) => {
            println!("  Records: {}", db.count_processed()?);
            if let Ok(size) = db.size_on_disk() {
                println!("  Size: {}", format_size(size));
            }
            if db.integrity_check()? {
                println!("  {} Integrity OK", "●".green());
            } else {
                println!("  {} Integrity check failed", "✗".red());
            }
            if let Some(latest) = db.list_processed(Some(1))?.first() {
                println!(
                    "  Last processed: {} ({})",
                    latest.file_name,
                    latest.processed_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        None => println!("  {}", "Not created yet. Run 'docloader init'.".dimmed()),
    }

    Ok(())
}
