//! flowlink-http-core
//!
//! Shared HTTP execution engine behind the flowlink HTTP task connectors.
//! Each task crate (`flowlink-http-request`, `flowlink-http-download-file`,
//! ...) is a thin adapter over this crate: the engine owns client
//! construction and caching, authentication material resolution, header
//! composition, request execution and response materialization.
#![deny(unsafe_code)]

pub mod cache;
pub mod certs;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod headers;
pub mod response;
pub mod transport;
pub mod types;

pub use cache::ClientCache;
pub use certs::{CertificateStore, DirectoryCertificateStore, StoredIdentity};
pub use error::HttpTaskError;
pub use executor::Engine;
pub use response::{BodyFormat, MaterializedResponse, ResponseBody};
pub use transport::{ReqwestTransportBuilder, TransportClient, TransportClientBuilder};
pub use types::{
    Authentication, BodyMethod, CertificateSource, Header, Method, Options, OptionsBuilder,
    RequestContent, RequestSpec,
};
