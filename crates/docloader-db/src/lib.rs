//! Docloader DB - SQLite-backed ledger of processed files.

mod database;
mod error;
mod ledger;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use ledger::Ledger;
