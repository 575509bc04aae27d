//! Generic HTTP request task.
//!
//! Executes one HTTP call and returns the response either as raw text or as
//! a parsed JSON value, per the input's [`ResultKind`]. All transport
//! behavior (client caching, authentication, header composition, error
//! policy) lives in the shared engine.
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use flowlink_http_core::{BodyFormat, Engine, RequestContent, RequestSpec, TransportClientBuilder};

pub use flowlink_http_core::{
    Authentication, CertificateSource, Header, HttpTaskError, Method, Options, OptionsBuilder,
    ResponseBody,
};
pub use tokio_util::sync::CancellationToken;

/// How the response body is returned to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    /// Raw text body.
    #[default]
    Text,
    /// Body parsed as a JSON value; empty bodies materialize as an explicit
    /// empty string value.
    Json,
}

/// Input for the request task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// The HTTP method to be used with the request.
    pub method: Method,
    /// The URL with protocol and path. Query parameters can be included
    /// directly in the URL.
    pub url: String,
    /// The message text to be sent with the request. Ignored for methods
    /// that do not carry a body.
    pub message: String,
    /// HTTP headers to be added to the request.
    pub headers: Vec<Header>,
    /// Shape of the returned body.
    pub result_kind: ResultKind,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            method: Method::Get,
            url: String::new(),
            message: String::new(),
            headers: Vec::new(),
            result_kind: ResultKind::Text,
        }
    }
}

/// Result of the request task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Response body in the requested shape.
    pub body: ResponseBody,
    /// Combined response headers.
    pub headers: HashMap<String, String>,
    /// HTTP status code.
    pub status_code: u16,
}

/// The request task. Owns its client cache; construct once and reuse across
/// calls to benefit from client reuse.
pub struct RequestTask {
    engine: Engine,
}

impl RequestTask {
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
    ) -> Result<TaskResult, HttpTaskError> {
        let spec = RequestSpec {
            method: input.method,
            url: input.url.clone(),
            headers: input.headers.clone(),
            content: RequestContent::Text(input.message.clone()),
        };
        let format = match input.result_kind {
            ResultKind::Text => BodyFormat::Text,
            ResultKind::Json => BodyFormat::Json,
        };
        let response = self
            .engine
            .execute(&spec, options, format, &cancellation)
            .await?;
        Ok(TaskResult {
            body: response.body,
            headers: response.headers,
            status_code: response.status_code,
        })
    }
}

impl Default for RequestTask {
    fn default() -> Self {
        Self::new()
    }
}
