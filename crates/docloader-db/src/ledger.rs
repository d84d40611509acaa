//! The ledger seam used by the scheduler.

use crate::database::Database;
use crate::error::DbResult;
use docloader_core::ProcessedFile;

/// Durable, append-only record of content fingerprints already handed to ingestion.
///
/// Implementations must enforce checksum uniqueness at the storage layer:
/// `record` fails with [`DbError::DuplicateChecksum`](crate::DbError::DuplicateChecksum)
/// when the checksum is already present, and leaves nothing behind on any other failure.
pub trait Ledger: Send + Sync {
    /// Whether a record with this checksum exists.
    fn lookup(&self, checksum: &str) -> DbResult<bool>;

    /// Append a record for a successfully ingested file.
    fn record(&self, file_name: &str, checksum: &str) -> DbResult<ProcessedFile>;
}

impl Ledger for Database {
    fn lookup(&self, checksum: &str) -> DbResult<bool> {
        self.is_processed(checksum)
    }

    fn record(&self, file_name: &str, checksum: &str) -> DbResult<ProcessedFile> {
        self.record_processed(file_name, checksum)
    }
}
