//! Backend that hands each file to an external program.

use crate::error::{IngestError, IngestResult};
use crate::port::IngestionPort;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs `<program> <args...> <file>` and treats a zero exit status as success.
#[derive(Debug, Clone)]
pub struct CommandPort {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandPort {
    /// Resolve the program on `PATH` (or as given) up front.
    pub fn new(program: &str, args: Vec<String>) -> IngestResult<Self> {
        let program = which::which(program).map_err(|_| IngestError::ToolNotFound {
            tool: program.to_string(),
        })?;

        Ok(Self { program, args })
    }
}

#[async_trait]
impl IngestionPort for CommandPort {
    async fn ingest(&self, path: &Path) -> IngestResult<()> {
        debug!("Running {:?} for {}", self.program, path.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| IngestError::ingestion(path, format!("failed to start {:?}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match output.status.code() {
                Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(IngestError::ingestion(path, message));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "command"
    }
}
