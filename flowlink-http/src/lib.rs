//! # flowlink-http
//!
//! HTTP task connectors for the flowlink integration platform. Each task
//! wraps a single HTTP operation behind a typed input/options/result
//! contract; all of them share one execution engine
//! ([`flowlink_http_core`]) for client caching, authentication, header
//! composition and response materialization.
//!
//! ## Tasks
//!
//! - [`request`]: generic request returning text or a parsed JSON value
//! - [`request_bytes`]: request returning the body as raw bytes
//! - [`send_bytes`]: byte-array request body with a text or byte response
//! - [`download_file`]: streams the response body to a file
//! - [`upload_file`]: streams a local file as the request body
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use flowlink_http::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let task = RequestTask::new();
//!     let input = request::Input {
//!         url: "https://example.org/api/items?active=true".into(),
//!         ..request::Input::default()
//!     };
//!     let options = Options::builder().throw_on_error_response(true).build();
//!     let result = task.run(&input, &options, CancellationToken::new()).await?;
//!     println!("{}: {:?}", result.status_code, result.body);
//!     Ok(())
//! }
//! ```
#![deny(unsafe_code)]

pub use flowlink_http_core as core;

/// Generic HTTP request task.
pub mod request {
    pub use flowlink_http_request::*;
}

/// Byte-result HTTP request task.
pub mod request_bytes {
    pub use flowlink_http_request_bytes::*;
}

/// Byte-sending HTTP tasks.
pub mod send_bytes {
    pub use flowlink_http_send_bytes::*;
}

/// File download task.
pub mod download_file {
    pub use flowlink_http_download_file::*;
}

/// File upload task.
pub mod upload_file {
    pub use flowlink_http_upload_file::*;
}

pub use flowlink_http_core::{
    Authentication, BodyMethod, CertificateSource, DirectoryCertificateStore, Header,
    HttpTaskError, Method, Options, OptionsBuilder, TransportClientBuilder,
};
pub use tokio_util::sync::CancellationToken;

/// Common imports for task callers.
pub mod prelude {
    pub use crate::download_file::DownloadFileTask;
    pub use crate::request::RequestTask;
    pub use crate::request_bytes::RequestBytesTask;
    pub use crate::send_bytes::{SendAndReceiveBytesTask, SendBytesTask};
    pub use crate::upload_file::UploadFileTask;
    pub use crate::{
        Authentication, BodyMethod, CancellationToken, CertificateSource, Header, HttpTaskError,
        Method, Options, OptionsBuilder, download_file, request, request_bytes, send_bytes,
        upload_file,
    };
}
