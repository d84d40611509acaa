//! CLI command implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod list;
pub mod run;
pub mod scan;
pub mod status;

use anyhow::{Context, Result};
use docloader_config::{AppPaths, Config};
use docloader_db::Database;
use docloader_ingest::{backends, Scanner, Scheduler, SchedulerOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Paths and configuration resolved from the global CLI options.
pub struct Env {
    pub paths: AppPaths,
    pub config: Config,
}

impl Env {
    /// Resolve paths (honouring `--config`) and load the config file.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut paths = AppPaths::new().context("Failed to determine application directories")?;
        if let Some(file) = config_file {
            paths = paths.with_config_file(file);
        }

        let config = Config::load_from(&paths.config_file).with_context(|| {
            format!("Failed to load config from {}", paths.config_file.display())
        })?;

        let data_dir = config.data_dir(&paths);
        let paths = paths.with_data_dir(data_dir);

        Ok(Self { paths, config })
    }

    /// Open the ledger, creating it if needed.
    pub fn open_ledger(&self) -> Result<Database> {
        Database::open(&self.paths.database_file).context("Failed to open ledger")
    }

    /// Open the ledger only if it already exists.
    pub fn existing_ledger(&self) -> Result<Option<Database>> {
        if !self.paths.database_file.exists() {
            return Ok(None);
        }
        self.open_ledger().map(Some)
    }

    /// Wire ledger, scanner and ingestion backend into a scheduler.
    pub fn build_scheduler(&self) -> Result<Scheduler> {
        self.config.validate().context("Invalid configuration")?;

        let directory = self
            .config
            .loader
            .resolved_location()
            .context("Failed to resolve loader.location")?;
        let scanner = Scanner::from_config(&self.config.loader)?;
        let port = backends::from_config(&self.config.ingest)
            .context("Failed to set up ingestion backend")?;
        let ledger = Arc::new(self.open_ledger()?);

        Ok(Scheduler::new(
            directory,
            SchedulerOptions::from_config(&self.config.loader),
            ledger,
            port,
        )
        .with_scanner(scanner))
    }
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
