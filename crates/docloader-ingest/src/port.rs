//! The hand-off seam between the scheduler and the downstream pipeline.

use crate::error::IngestResult;
use async_trait::async_trait;
use std::path::Path;

/// Downstream pipeline that turns a file into whatever representation the
/// application needs (parsing, chunking, embedding...).
///
/// Implementations:
/// - `LogPort`: logs the hand-off (dry run)
/// - `CommandPort`: runs an external program with the file path
/// - `HttpPort`: posts the file bytes to an HTTP endpoint
///
/// The scheduler does not assume implementations are idempotent; it records
/// a file only after `ingest` returned `Ok`.
#[async_trait]
pub trait IngestionPort: Send + Sync {
    /// Hand a file to the pipeline.
    async fn ingest(&self, path: &Path) -> IngestResult<()>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
