//! Scan command - perform a single run immediately.

use super::Env;
use anyhow::{Context, Result};
use colored::Colorize;
use docloader_core::RunReport;
use docloader_ingest::RunOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Runtime;

pub fn run(env: &Env, json: bool) -> Result<()> {
    let scheduler = env.build_scheduler()?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Scanning {}", scheduler.directory().display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = rt.block_on(scheduler.run_once());
    pb.finish_and_clear();

    match outcome {
        RunOutcome::Completed(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        RunOutcome::Aborted(reason) => anyhow::bail!("Scan aborted: {}", reason),
        RunOutcome::Skipped => anyhow::bail!("Another scan is already running"),
    }
}

fn print_report(report: &RunReport) {
    println!("{}", "Scan Complete".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("  Files found:        {}", report.scanned);
    println!("  {} Ingested:        {}", "●".green(), report.ingested);
    println!("  {} Already known:   {}", "○".dimmed(), report.already_processed);
    if report.duplicates > 0 {
        println!("  {} Duplicates:      {}", "○".dimmed(), report.duplicates);
    }
    if report.fingerprint_failed > 0 {
        println!("  {} Unreadable:      {}", "✗".red(), report.fingerprint_failed);
    }
    if report.ingest_failed > 0 {
        println!("  {} Ingest failed:   {}", "✗".red(), report.ingest_failed);
    }
    if report.record_failed > 0 {
        println!("  {} Not recorded:    {}", "✗".red(), report.record_failed);
    }
    if let Some(ms) = report.duration_ms() {
        println!("  Took {} ms", ms);
    }

    if !report.is_clean() {
        println!();
        println!(
            "{}",
            "Failed files stay eligible and will be retried on the next scan.".dimmed()
        );
    }
}
