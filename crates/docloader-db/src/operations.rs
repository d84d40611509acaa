//! Database operations.

pub mod processed_files;
