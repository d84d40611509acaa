//! Ingestion backends selectable from configuration.

mod command;
mod http;
mod dry_run;

pub use command::CommandPort;
pub use http::HttpPort;
pub use dry_run::LogPort;

use crate::error::IngestResult;
use crate::port::IngestionPort;
use docloader_config::{IngestBackend, IngestConfig};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured ingestion backend.
pub fn from_config(config: &IngestConfig) -> IngestResult<Arc<dyn IngestionPort>> {
    let port: Arc<dyn IngestionPort> = match config.backend {
        IngestBackend::Log => Arc::new(LogPort),
        IngestBackend::Command => Arc::new(CommandPort::new(&config.command, config.args.clone())?),
        IngestBackend::Http => Arc::new(HttpPort::new(
            &config.endpoint,
            Duration::from_secs(config.timeout_seconds),
        )?),
    };
    Ok(port)
}
