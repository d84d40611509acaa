//! Content fingerprinting.
//!
//! A fingerprint is the lowercase hex SHA-256 digest of a file's bytes. It
//! depends on nothing but the content, so renamed or copied files keep it.

use crate::error::{IngestError, IngestResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Computes content fingerprints for the scheduler.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, path: &Path) -> IngestResult<String>;
}

/// SHA-256 fingerprinter used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, path: &Path) -> IngestResult<String> {
        fingerprint_file(path)
    }
}

/// Compute the fingerprint of a file, streaming it through a fixed buffer.
pub fn fingerprint_file(path: &Path) -> IngestResult<String> {
    let file = File::open(path).map_err(|source| IngestError::Fingerprint {
        path: path.to_path_buf(),
        source,
    })?;

    fingerprint_reader(file).map_err(|source| IngestError::Fingerprint {
        path: path.to_path_buf(),
        source,
    })
}

/// Compute the fingerprint of everything a reader yields.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
