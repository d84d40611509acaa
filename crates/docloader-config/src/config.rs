//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new()?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let contents = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Docloader Configuration

[general]
# Data directory for the processed-file ledger
# data_dir = "~/.local/share/docloader"

[loader]
# Folder to scan for new documents (relative paths resolve against the working directory)
location = "./documents"

# Seconds between scans. A scan still running when the next one is due causes that one to be skipped.
period_seconds = 60

# Seconds to wait after startup before the first scan
delay_seconds = 2

# Upper bound for handing a single file to ingestion (0 = no limit)
file_timeout_seconds = 600

# Files processed in parallel within one scan (1 = sequential)
max_concurrent_files = 1

# Only consider files matching these patterns (empty = all files)
include_patterns = []

# File patterns to ignore
ignore_patterns = [
    "*.tmp",
    "*.temp",
    "*.part",
    ".DS_Store",
    "._*",
]

[ingest]
# Where new files are handed off: "log", "command" or "http"
backend = "log"

# Program for backend = "command"; the file path is appended as the last argument
command = ""
args = []

# URL for backend = "http"; the file is POSTed as the request body
endpoint = ""

# HTTP request timeout in seconds
timeout_seconds = 120
"#
        .to_string()
    }

    /// Check that values are usable before starting the scheduler.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.loader.location.trim().is_empty() {
            return Err(ConfigError::Invalid("loader.location must not be empty".into()));
        }
        if self.loader.period_seconds == 0 {
            return Err(ConfigError::Invalid("loader.period_seconds must be greater than 0".into()));
        }
        if self.loader.max_concurrent_files == 0 {
            return Err(ConfigError::Invalid(
                "loader.max_concurrent_files must be greater than 0".into(),
            ));
        }
        for pattern in self
            .loader
            .include_patterns
            .iter()
            .chain(self.loader.ignore_patterns.iter())
        {
            glob_check(pattern)?;
        }

        match self.ingest.backend {
            IngestBackend::Log => {}
            IngestBackend::Command if self.ingest.command.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "ingest.command is required when ingest.backend = \"command\"".into(),
                ));
            }
            IngestBackend::Command => {}
            IngestBackend::Http if self.ingest.endpoint.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "ingest.endpoint is required when ingest.backend = \"http\"".into(),
                ));
            }
            IngestBackend::Http => {}
        }

        Ok(())
    }

    /// Data directory, honouring `general.data_dir` when set.
    pub fn data_dir(&self, paths: &AppPaths) -> PathBuf {
        match &self.general.data_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => paths.data_dir.clone(),
        }
    }
}

fn glob_check(pattern: &str) -> ConfigResult<()> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("bad file pattern {:?}: {}", pattern, e)))
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// Folder scanning and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub location: String,
    pub period_seconds: u64,
    pub delay_seconds: u64,
    pub file_timeout_seconds: u64,
    pub max_concurrent_files: usize,
    pub include_patterns: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            location: "./documents".to_string(),
            period_seconds: 60,
            delay_seconds: 2,
            file_timeout_seconds: 600,
            max_concurrent_files: 1,
            include_patterns: vec![],
            ignore_patterns: vec![
                "*.tmp".to_string(),
                "*.temp".to_string(),
                "*.part".to_string(),
                ".DS_Store".to_string(),
                "._*".to_string(),
            ],
        }
    }
}

impl LoaderConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_seconds)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    /// Per-file ingestion timeout, `None` when disabled.
    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_seconds > 0).then(|| Duration::from_secs(self.file_timeout_seconds))
    }

    /// Resolve the watched folder to an absolute, normalized path.
    pub fn resolved_location(&self) -> ConfigResult<PathBuf> {
        let expanded = shellexpand::tilde(&self.location);
        let path = Path::new(expanded.as_ref());
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(normalize(&absolute))
    }
}

/// Lexically normalize a path, dropping `.` and folding `..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Where newly detected files are handed off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestBackend {
    #[default]
    Log,
    Command,
    Http,
}

impl IngestBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestBackend::Log => "log",
            IngestBackend::Command => "command",
            IngestBackend::Http => "http",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "log" => Some(IngestBackend::Log),
            "command" => Some(IngestBackend::Command),
            "http" => Some(IngestBackend::Http),
            _ => None,
        }
    }
}

impl fmt::Display for IngestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingestion hand-off settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub backend: IngestBackend,
    pub command: String,
    pub args: Vec<String>,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            backend: IngestBackend::Log,
            command: String::new(),
            args: vec![],
            endpoint: String::new(),
            timeout_seconds: 120,
        }
    }
}
