//! HTTP file download task.
//!
//! Issues one GET request and streams the response body to a destination
//! path. The destination is guarded before any network I/O: an existing file
//! is only replaced when the input asks for it.
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use flowlink_http_core::{
    Engine, Method, RequestContent, RequestSpec, TransportClientBuilder, response,
};

pub use flowlink_http_core::{
    Authentication, CertificateSource, Header, HttpTaskError, Options, OptionsBuilder,
};
pub use tokio_util::sync::CancellationToken;

/// Input for the download task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// The URL with protocol and path.
    pub url: String,
    /// HTTP headers to be added to the request.
    pub headers: Vec<Header>,
    /// Exact location and name of the file to be created.
    pub file_path: PathBuf,
    /// Replace the destination file when it already exists. When false, an
    /// existing destination fails the task and the file is left untouched.
    pub overwrite: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: Vec::new(),
            file_path: PathBuf::new(),
            overwrite: false,
        }
    }
}

/// Result of the download task.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Task completed and the file was written.
    pub success: bool,
    /// Path of the created file.
    pub file_path: PathBuf,
}

/// The file download task.
pub struct DownloadFileTask {
    engine: Engine,
}

impl DownloadFileTask {
    /// Task backed by the production transport.
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
        }
    }

    /// Task backed by an injected transport builder.
    pub fn with_builder(builder: Arc<dyn TransportClientBuilder>) -> Self {
        Self {
            engine: Engine::with_builder(builder),
        }
    }

    /// Drop every cached transport client.
    pub fn clear_client_cache(&self) {
        self.engine.clear_client_cache();
    }

    /// Execute the download.
    pub async fn run(
        &self,
        input: &Input,
        options: &Options,
        cancellation: CancellationToken,
    ) -> Result<DownloadResult, HttpTaskError> {
        if input.file_path.as_os_str().is_empty() {
            return Err(HttpTaskError::configuration("file path can not be empty"));
        }
        // Destination precondition comes before any network I/O.
        if !input.overwrite && input.file_path.exists() {
            return Err(HttpTaskError::configuration(format!(
                "file '{}' already exists and overwrite is disabled",
                input.file_path.display()
            )));
        }

        let spec = RequestSpec {
            method: Method::Get,
            url: input.url.clone(),
            headers: input.headers.clone(),
            content: RequestContent::Empty,
        };
        let raw = self.engine.send(&spec, options, &cancellation).await?;

        let status = raw.status();
        if !status.is_success() && options.throw_on_error_response {
            let body = raw
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable response body>"));
            return Err(HttpTaskError::ErrorResponse {
                url: input.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        // create_new re-checks existence at open time, so a file appearing
        // after the precondition still cannot be clobbered.
        let mut open_options = tokio::fs::OpenOptions::new();
        open_options.write(true);
        if input.overwrite {
            open_options.create(true).truncate(true);
        } else {
            open_options.create_new(true);
        }
        let mut file = open_options.open(&input.file_path).await?;

        let mut stream = raw.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            if cancellation.is_cancelled() {
                return Err(HttpTaskError::Canceled);
            }
            let chunk = chunk.map_err(|e| HttpTaskError::transport(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(
            path = %input.file_path.display(),
            bytes = written,
            size_mb = response::size_in_megabytes(written as usize),
            "download complete"
        );
        Ok(DownloadResult {
            success: true,
            file_path: input.file_path.clone(),
        })
    }
}

impl Default for DownloadFileTask {
    fn default() -> Self {
        Self::new()
    }
}
