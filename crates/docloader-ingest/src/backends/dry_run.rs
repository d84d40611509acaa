//! Backend that only logs the hand-off.

use crate::error::IngestResult;
use crate::port::IngestionPort;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Dry-run backend: every file is accepted without being sent anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPort;

#[async_trait]
impl IngestionPort for LogPort {
    async fn ingest(&self, path: &Path) -> IngestResult<()> {
        info!("Would ingest: {}", path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
