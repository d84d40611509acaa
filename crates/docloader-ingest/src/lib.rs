//! Docloader Ingest - Folder scanning and deduplicated hand-off to ingestion.
//!
//! This crate provides:
//! - Content fingerprinting (streaming SHA-256)
//! - Snapshot scanning of the watched folder
//! - The ingestion port and its configurable backends
//! - The periodic, non-overlapping scheduler that ties them to the ledger

pub mod backends;
mod error;
mod fingerprint;
mod port;
mod scanner;
mod scheduler;

pub use error::{IngestError, IngestResult};
pub use fingerprint::{fingerprint_file, fingerprint_reader, Fingerprinter, Sha256Fingerprinter};
pub use port::IngestionPort;
pub use scanner::{Scan, Scanner};
pub use scheduler::{RunOutcome, Scheduler, SchedulerOptions, SchedulerStats, StatsSnapshot};
