//! Processed file ledger operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use docloader_core::ProcessedFile;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

impl Database {
    /// Append a processed file record.
    ///
    /// The insert runs in its own transaction; if anything fails the
    /// transaction is dropped and rolled back, so no partial record is visible.
    pub fn record_processed(&self, file_name: &str, checksum: &str) -> DbResult<ProcessedFile> {
        let mut conn = self.conn()?;
        let processed_at = Utc::now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO processed_files (file_name, checksum, processed_at) VALUES (?1, ?2, ?3)",
            params![file_name, checksum, processed_at.to_rfc3339()],
        )
        .map_err(|e| map_unique_violation(e, checksum))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Recorded {} as {} (id {})", file_name, checksum, id);

        Ok(ProcessedFile {
            id,
            file_name: file_name.to_string(),
            checksum: checksum.to_string(),
            processed_at,
        })
    }

    /// Check whether a checksum has been recorded.
    pub fn is_processed(&self, checksum: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM processed_files WHERE checksum = ?1)",
            params![checksum],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Find the record for a checksum.
    pub fn find_by_checksum(&self, checksum: &str) -> DbResult<Option<ProcessedFile>> {
        let conn = self.conn()?;
        let file = conn
            .query_row(
                "SELECT id, file_name, checksum, processed_at FROM processed_files WHERE checksum = ?1",
                params![checksum],
                row_to_processed_file,
            )
            .optional()?;
        Ok(file)
    }

    /// List records, newest first.
    pub fn list_processed(&self, limit: Option<i64>) -> DbResult<Vec<ProcessedFile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, file_name, checksum, processed_at FROM processed_files
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit.unwrap_or(-1)], row_to_processed_file)?;
        let files = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    /// Count recorded files.
    pub fn count_processed(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM processed_files", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn map_unique_violation(err: rusqlite::Error, checksum: &str) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DbError::DuplicateChecksum(checksum.to_string())
        }
        _ => DbError::from(err),
    }
}

fn row_to_processed_file(row: &rusqlite::Row) -> rusqlite::Result<ProcessedFile> {
    let processed_at_str: String = row.get(3)?;

    Ok(ProcessedFile {
        id: row.get(0)?,
        file_name: row.get(1)?,
        checksum: row.get(2)?,
        processed_at: DateTime::parse_from_rfc3339(&processed_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
