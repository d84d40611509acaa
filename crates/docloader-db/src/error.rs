//! Database error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Checksum already recorded: {0}")]
    DuplicateChecksum(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DbError {
    /// Whether this error only reports that another writer got there first.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DbError::DuplicateChecksum(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;
