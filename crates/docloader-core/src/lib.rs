//! Docloader Core - Core types shared by the ledger, scheduler and CLI.

mod types;

pub use types::*;
