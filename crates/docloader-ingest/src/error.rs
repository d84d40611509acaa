//! Error types for scanning and ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while scanning and ingesting files.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] docloader_db::DbError),

    /// The watched directory could not be listed. Aborts the current run only.
    #[error("Cannot access directory {path}: {message}")]
    DirectoryAccess { path: PathBuf, message: String },

    /// A file could not be read while computing its fingerprint.
    #[error("Cannot fingerprint {path}: {source}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ingestion backend rejected the file.
    #[error("Ingestion failed for {path}: {message}")]
    Ingestion { path: PathBuf, message: String },

    #[error("Ingestion of {path} timed out after {seconds} seconds")]
    Timeout { path: PathBuf, seconds: u64 },

    #[error("Tool not found: {tool}. Please install it.")]
    ToolNotFound { tool: String },

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    pub fn ingestion(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IngestError::Ingestion {
            path: path.into(),
            message: message.into(),
        }
    }
}
