//! HTTP file upload task.
//!
//! Streams a local file's bytes as the request body and returns the server's
//! response as text. The source file is checked before any network I/O.
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use flowlink_http_core::{
    BodyFormat, Engine, RequestContent, RequestSpec, TransportClientBuilder,
};

pub use flowlink_http_core::{
    Authentication, BodyMethod, CertificateSource, Header, HttpTaskError, Options, OptionsBuilder,
};
pub use tokio_util::sync::CancellationToken;

/// Input for the upload task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// The HTTP method to be used with the request; only body-carrying verbs
    /// are available.
    pub method: BodyMethod,
    /// The URL with protocol and path.
    pub url: String,
    /// The file whose bytes become the request body.
    pub file_path: PathBuf,
    /// HTTP headers to be added to the request.
    pub headers: Vec<Header>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            method: BodyMethod::Post,
            url: String::new(),
            file_path: PathBuf::new(),
            headers: Vec::new(),
        }
    }
}

/// Response received from the server after the upload.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response body text.
    pub body: String,
    /// Combined response headers.
    pub headers: HashMap<String, String>,
    /// HTTP status code.
    pub status_code: u16,
}

/// The file upload task.
pub struct UploadFileTask {
    engine: Engine,
}

impl UploadFileTask {
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

    /// Execute the upload.
    pub async fn run(
        &self,
        input: &Input,
        options: &Options,
        cancellation: CancellationToken,
    ) -> Result<Response, HttpTaskError> {
        // Source precondition comes before any network I/O.
        if !input.file_path.is_file() {
            return Err(HttpTaskError::configuration(format!(
                "file '{}' does not exist or is not a file",
                input.file_path.display()
            )));
        }

        let spec = RequestSpec {
            method: input.method.into(),
            url: input.url.clone(),
            headers: input.headers.clone(),
            content: RequestContent::File(input.file_path.clone()),
        };
        let materialized = self
            .engine
            .execute(&spec, options, BodyFormat::Text, &cancellation)
            .await?;
        Ok(Response {
            body: materialized.body.into_text(),
            headers: materialized.headers,
            status_code: materialized.status_code,
        })
    }
}

impl Default for UploadFileTask {
    fn default() -> Self {
        Self::new()
    }
}
