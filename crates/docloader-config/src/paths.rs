//! Where docloader keeps its config file and ledger.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";
const LEDGER_FILE_NAME: &str = "docloader.db";

/// Resolved locations of the config file and the ledger database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl AppPaths {
    /// Platform defaults, e.g. `~/.config/docloader` and `~/.local/share/docloader` on Linux.
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("io", "crunch", "docloader").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::from_dirs(dirs.config_dir(), dirs.data_dir()))
    }

    pub fn from_dirs(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            config_file: config_dir.join(CONFIG_FILE_NAME),
            database_file: data_dir.join(LEDGER_FILE_NAME),
        }
    }

    /// Move the ledger into `data_dir`.
    pub fn with_data_dir(self, data_dir: PathBuf) -> Self {
        Self {
            database_file: data_dir.join(LEDGER_FILE_NAME),
            data_dir,
            ..self
        }
    }

    /// Read and write config at `config_file` instead of the default location.
    pub fn with_config_file(self, config_file: PathBuf) -> Self {
        let config_dir = match config_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            config_dir,
            config_file,
            ..self
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)
    }

    /// Both the config file and the ledger exist.
    pub fn is_initialized(&self) -> bool {
        self.config_file.is_file() && self.database_file.is_file()
    }
}
