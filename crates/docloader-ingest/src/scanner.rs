//! Snapshot listing of the watched folder.

use crate::error::{IngestError, IngestResult};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Lists candidate files in a directory on each run.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    include_patterns: Vec<Pattern>,
    ignore_patterns: Vec<Pattern>,
}

impl Scanner {
    /// Create a scanner that accepts every regular file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner from configured glob patterns.
    pub fn from_config(config: &docloader_config::LoaderConfig) -> IngestResult<Self> {
        let include_patterns = config
            .include_patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_patterns,
            ignore_patterns,
        })
    }

    /// Start listing a directory.
    ///
    /// The directory itself is checked eagerly; its entries are read lazily.
    /// Only direct children are returned, and only regular files (symlinks
    /// are followed, so a link to a directory is dropped).
    pub fn scan(&self, dir: &Path) -> IngestResult<Scan<'_>> {
        let mut walker = WalkDir::new(dir)
            .min_depth(0)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        match walker.next() {
            Some(Ok(root)) if root.file_type().is_dir() => {}
            Some(Ok(_)) => {
                return Err(IngestError::DirectoryAccess {
                    path: dir.to_path_buf(),
                    message: "not a directory".to_string(),
                })
            }
            Some(Err(e)) => return Err(directory_error(dir, &e)),
            None => {
                return Err(IngestError::DirectoryAccess {
                    path: dir.to_path_buf(),
                    message: "directory vanished".to_string(),
                })
            }
        }

        Ok(Scan {
            scanner: self,
            root: dir.to_path_buf(),
            walker,
            failed: false,
        })
    }

    /// Check whether a file name passes the include and ignore patterns.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if self.ignore_patterns.iter().any(|p| p.matches(name)) {
            return false;
        }

        self.include_patterns.is_empty() || self.include_patterns.iter().any(|p| p.matches(name))
    }
}

/// Lazy, finite listing of one directory.
///
/// Yields `Err(DirectoryAccess)` at most once, after which the listing ends.
pub struct Scan<'a> {
    scanner: &'a Scanner,
    root: PathBuf,
    walker: walkdir::IntoIter,
    failed: bool,
}

impl Iterator for Scan<'_> {
    type Item = IngestResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        debug!("Skipping non-regular entry: {:?}", entry.path());
                        continue;
                    }
                    if !self.scanner.accepts(entry.path()) {
                        debug!("Ignoring file: {:?}", entry.path());
                        continue;
                    }
                    return Some(Ok(entry.into_path()));
                }
                // Failure reading the directory itself
                Err(e) if e.depth() == 0 => {
                    self.failed = true;
                    return Some(Err(directory_error(&self.root, &e)));
                }
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", self.root, e);
                }
            }
        }
    }
}

fn directory_error(dir: &Path, err: &walkdir::Error) -> IngestError {
    let message = match err.io_error() {
        Some(io) => io.to_string(),
        None => err.to_string(),
    };
    IngestError::DirectoryAccess {
        path: dir.to_path_buf(),
        message,
    }
}
