//! SQLite storage behind the ledger.

use crate::error::{DbError, DbResult};
use crate::migrations;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled handle to the ledger database.
///
/// Cloning is cheap and shares the pool, so lookups from concurrent file
/// tasks each get their own connection.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
    location: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the ledger file at `path` and bring its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Other(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        info!("Opening ledger at: {}", path.display());

        let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
        Self::from_manager(manager, POOL_SIZE, Some(path.to_path_buf()))
    }

    /// In-memory ledger, used by tests and dry runs.
    pub fn open_in_memory() -> DbResult<Self> {
        // Each connection to :memory: sees its own database, so keep exactly one.
        Self::from_manager(SqliteConnectionManager::memory(), 1, None)
    }

    fn from_manager(
        manager: SqliteConnectionManager,
        max_size: u32,
        location: Option<PathBuf>,
    ) -> DbResult<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        {
            let conn = pool.get()?;
            migrations::initialize_schema(&conn)?;
        }

        Ok(Self { pool, location })
    }

    /// Path of the backing file; `None` for in-memory ledgers.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn conn(&self) -> DbResult<PooledConn> {
        self.pool.get().map_err(DbError::from)
    }

    /// Bytes used by the main database file. In-memory ledgers report 0.
    pub fn size_on_disk(&self) -> DbResult<u64> {
        let Some(path) = &self.location else {
            return Ok(0);
        };
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| DbError::Other(format!("cannot stat {}: {}", path.display(), e)))
    }

    /// `true` when `PRAGMA integrity_check` reports no problems.
    pub fn integrity_check(&self) -> DbResult<bool> {
        let conn = self.conn()?;
        let result: String = conn.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        Ok(result == "ok")
    }
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
