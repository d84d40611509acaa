//! Core domain types for Docloader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the ledger when a record is appended.
pub type RecordId = i64;

/// Length of a hex-encoded SHA-256 digest.
pub const CHECKSUM_LEN: usize = 64;

/// Check that a string looks like a checksum produced by the fingerprinter.
pub fn is_valid_checksum(s: &str) -> bool {
    s.len() == CHECKSUM_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A file that has been handed to ingestion and recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub id: RecordId,
    /// Base name of the file when it was processed. Not part of the dedup key.
    pub file_name: String,
    /// Lowercase hex content digest, unique across the ledger.
    pub checksum: String,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedFile {
    /// Short form of the checksum for display.
    pub fn short_checksum(&self) -> &str {
        &self.checksum[..self.checksum.len().min(12)]
    }
}

impl fmt::Display for ProcessedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name, self.short_checksum())
    }
}

/// Counters collected during one scheduled run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Candidate files returned by the scanner.
    pub scanned: usize,
    /// Files whose fingerprint was already in the ledger.
    pub already_processed: usize,
    /// Files handed to ingestion and recorded.
    pub ingested: usize,
    /// Files that could not be read for fingerprinting.
    pub fingerprint_failed: usize,
    /// Files the ingestion port rejected or timed out on.
    pub ingest_failed: usize,
    /// Files ingested whose ledger write failed, or whose lookup failed.
    pub record_failed: usize,
    /// Files ingested whose checksum was recorded concurrently by another file.
    pub duplicates: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Start a new report stamped with the current time.
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Stamp the finish time.
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Total number of per-file failures.
    pub fn failures(&self) -> usize {
        self.fingerprint_failed + self.ingest_failed + self.record_failed
    }

    /// Whether every scanned file ended without a failure.
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    /// Run duration in milliseconds, if the run has finished.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned={} ingested={} already_processed={} duplicates={} failed(fingerprint={}, ingest={}, record={})",
            self.scanned,
            self.ingested,
            self.already_processed,
            self.duplicates,
            self.fingerprint_failed,
            self.ingest_failed,
            self.record_failed
        )
    }
}
