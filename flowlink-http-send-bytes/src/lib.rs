//! HTTP tasks that send a byte-array request body.
//!
//! Two operations share one input shape: [`SendBytesTask`] returns the
//! response as text, [`SendAndReceiveBytesTask`] returns it as raw bytes.
//! Both are restricted to body-carrying verbs.
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use flowlink_http_core::{
    BodyFormat, Engine, RequestContent, RequestSpec, TransportClientBuilder, response,
};

pub use flowlink_http_core::{
    Authentication, BodyMethod, CertificateSource, Header, HttpTaskError, Options, OptionsBuilder,
};
pub use tokio_util::sync::CancellationToken;

/// Input shared by the byte-sending tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// The HTTP method to be used with the request; only body-carrying verbs
    /// are available.
    pub method: BodyMethod,
    /// The URL with protocol and path.
    pub url: String,
    /// The content to send as a byte array.
    pub content_bytes: Vec<u8>,
    /// HTTP headers to be added to the request.
    pub headers: Vec<Header>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            method: BodyMethod::Post,
            url: String::new(),
            content_bytes: Vec::new(),
            headers: Vec::new(),
        }
    }
}

impl Input {
    fn to_spec(&self) -> RequestSpec {
        RequestSpec {
            method: self.method.into(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            content: RequestContent::Bytes(self.content_bytes.clone()),
        }
    }
}

/// Text-body result of [`SendBytesTask`].
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Response body text.
    pub body: String,
    /// Combined response headers.
    pub headers: HashMap<String, String>,
    /// HTTP status code.
    pub status_code: u16,
}

/// Byte-body result of [`SendAndReceiveBytesTask`].
#[derive(Debug, Clone)]
pub struct BytesResult {
    /// Raw response body. An empty body yields an empty array.
    pub body_bytes: Vec<u8>,
    /// Body size in megabytes, rounded to three decimals.
    pub body_size_in_megabytes: f64,
    /// Response content type, when the server declared one.
    pub content_type: Option<String>,
    /// Combined response headers.
    pub headers: HashMap<String, String>,
    /// HTTP status code.
    pub status_code: u16,
}

/// Sends a byte-array body and returns the response as text.
pub struct SendBytesTask {
    engine: Engine,
}

impl SendBytesTask {
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
    ) -> Result<SendResult, HttpTaskError> {
        let materialized = self
            .engine
            .execute(&input.to_spec(), options, BodyFormat::Text, &cancellation)
            .await?;
        Ok(SendResult {
            body: materialized.body.into_text(),
            headers: materialized.headers,
            status_code: materialized.status_code,
        })
    }
}

impl Default for SendBytesTask {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends a byte-array body and returns the response as raw bytes.
pub struct SendAndReceiveBytesTask {
    engine: Engine,
}

impl SendAndReceiveBytesTask {
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
        let materialized = self
            .engine
            .execute(&input.to_spec(), options, BodyFormat::Bytes, &cancellation)
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

impl Default for SendAndReceiveBytesTask {
    fn default() -> Self {
        Self::new()
    }
}
