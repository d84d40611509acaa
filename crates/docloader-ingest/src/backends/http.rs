//! Backend that posts each file to an HTTP endpoint.

use crate::error::{IngestError, IngestResult};
use crate::port::IngestionPort;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Header carrying the base name of the uploaded file.
pub const FILE_NAME_HEADER: &str = "X-File-Name";

/// Streams the file as an `application/octet-stream` POST body.
#[derive(Clone)]
pub struct HttpPort {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPort {
    pub fn new(endpoint: &str, timeout: Duration) -> IngestResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl IngestionPort for HttpPort {
    async fn ingest(&self, path: &Path) -> IngestResult<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| IngestError::ingestion(path, format!("cannot open file: {}", e)))?;
        let len = file.metadata().await.map(|m| m.len()).ok();

        debug!("POST {} ({}) to {}", file_name, path.display(), self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream");
        // Names with control characters cannot travel in a header; send the body without it.
        match HeaderValue::from_bytes(file_name.as_bytes()) {
            Ok(value) => request = request.header(FILE_NAME_HEADER, value),
            Err(_) => debug!("Omitting {} header for {:?}", FILE_NAME_HEADER, file_name),
        }
        if let Some(len) = len {
            request = request.header(CONTENT_LENGTH, len);
        }

        let response = request.body(Body::from(file)).send().await.map_err(|e| {
            if e.is_connect() {
                IngestError::ingestion(path, format!("endpoint unreachable: {}", self.endpoint))
            } else if e.is_timeout() {
                IngestError::Timeout {
                    path: path.to_path_buf(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                IngestError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IngestError::ingestion(
                path,
                format!("status {}: {}", status.as_u16(), text.trim()),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
