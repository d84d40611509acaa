//! Run command - scan the watched folder on a schedule until interrupted.

use super::Env;
use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::info;

pub fn run(env: &Env) -> Result<()> {
    let scheduler = Arc::new(env.build_scheduler()?);
    let options = scheduler.options().clone();

    println!("{}", "Starting document loader...".cyan());
    let directory = scheduler.directory();
    if directory.is_dir() {
        println!("  {} {}", "+".green(), directory.display());
    } else {
        println!(
            "  {} {} (not found, scans will fail until it exists)",
            "-".red(),
            directory.display()
        );
    }
    println!("  Backend: {}", env.config.ingest.backend);
    println!(
        "  Every {}s, first scan in {}s",
        options.period.as_secs(),
        options.startup_delay.as_secs()
    );
    println!("\nPress Ctrl+C to stop.\n");

    let rt = Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

        shutdown_signal().await?;

        info!("Shutdown requested");
        if scheduler.is_running() {
            println!("{}", "Finishing the current scan before exiting...".yellow());
        }
        let _ = shutdown_tx.send(true);
        timer.await.context("Scheduler task failed")?;

        Ok::<_, anyhow::Error>(())
    })?;

    let stats = scheduler.stats();
    println!();
    println!(
        "{} {} scans completed, {} aborted, {} ticks skipped",
        "Stopped.".green().bold(),
        stats.runs_completed,
        stats.runs_aborted,
        stats.ticks_skipped
    );

    Ok(())
}

/// Resolve on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl+C")?,
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")
    }
}
