//! HTTP request task with a byte-array result.
//!
//! Identical transport behavior to the generic request task; the response
//! body is returned as raw bytes plus a derived size metric, binary-safe.
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use flowlink_http_core::{
    BodyFormat, Engine, RequestContent, RequestSpec, TransportClientBuilder, response,
};

pub use flowlink_http_core::{
    Authentication, CertificateSource, Header, HttpTaskError, Method, Options, OptionsBuilder,
};
pub use tokio_util::sync::CancellationToken;

/// Input for the byte-result request task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// The HTTP method to be used with the request.
    pub method: Method,
    /// The URL with protocol and path.
    pub url: String,
    /// The message text to be sent with the request. Ignored for methods
    /// that do not carry a body.
    pub message: String,
    /// HTTP headers to be added to the request.
    pub headers: Vec<Header>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            method: Method::Get,
            url: String::new(),
            message: String::new(),
            headers: Vec::new(),
        }
    }
}

/// Byte-body result.
#[derive(Debug, Clone)]
pub struct BytesResult {
    /// Raw response body. An empty body yields an empty array.
    pub body_bytes: Vec<u8>,
    /// Body size in megabytes, rounded to three decimals; exactly 0.0 for an
    /// empty body.
    pub body_size_in_megabytes: f64,
    /// Response content type, when the server declared one.
    pub content_type: Option<String>,
    /// Combined response headers.
    pub headers: HashMap<String, String>,
    /// HTTP status code.
    pub status_code: u16,
}

/// The byte-result request task.
pub struct RequestBytesTask {
    engine: Engine,
}

impl RequestBytesTask {
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

    /// Execute the request.
    pub async fn run(
        &self,
        input: &Input,
        options: &Options,
        cancellation: CancellationToken,
    ) -> Result<BytesResult, HttpTaskError> {
        let spec = RequestSpec {
            method: input.method,
            url: input.url.clone(),
            headers: input.headers.clone(),
            content: RequestContent::Text(input.message.clone()),
        };
        let materialized = self
            .engine
            .execute(&spec, options, BodyFormat::Bytes, &cancellation)
            .await?;
        let body_bytes = materialized.body.into_bytes();
        Ok(BytesResult {
            body_size_in_megabytes: response::size_in_megabytes(body_bytes.len()),
            body_bytes,
            content_type: materialized.content_type,
            headers: materialized.headers,
            status_code: materialized.status_code,
        })
    }
}

impl Default for RequestBytesTask {
    fn default() -> Self {
        Self::new()
    }
}
