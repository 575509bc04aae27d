//! Transport client construction.
//!
//! The engine never builds `reqwest::Client` values directly: it goes
//! through the [`TransportClientBuilder`] capability, injected at engine
//! construction. Production code uses [`ReqwestTransportBuilder`]; tests
//! inject counting or stubbed builders. No network I/O happens during
//! construction.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::redirect;
use tracing::debug;

use crate::certs::{self, CertificateStore, DirectoryCertificateStore};
use crate::defaults;
use crate::error::HttpTaskError;
use crate::types::{Authentication, Options};

/// Explicit network credentials resolved from a `domain\user` username.
#[derive(Debug, Clone)]
pub struct NetworkCredentials {
    /// Authentication domain.
    pub domain: String,
    /// Username inside the domain.
    pub username: String,
    /// Password.
    pub password: String,
}

/// A configured transport-layer client plus the credential wiring the
/// executor applies per request. Cloning is cheap; the inner client is
/// reference-counted.
#[derive(Debug, Clone)]
pub struct TransportClient {
    inner: reqwest::Client,
    credentials: Option<NetworkCredentials>,
    ambient_credentials: bool,
}

impl TransportClient {
    /// Wrap an already-configured client.
    pub fn new(
        inner: reqwest::Client,
        credentials: Option<NetworkCredentials>,
        ambient_credentials: bool,
    ) -> Self {
        Self {
            inner,
            credentials,
            ambient_credentials,
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Explicit network credentials, when domain authentication is active.
    pub fn credentials(&self) -> Option<&NetworkCredentials> {
        self.credentials.as_ref()
    }

    /// Whether the calling process's ambient credentials should be used.
    pub fn uses_ambient_credentials(&self) -> bool {
        self.ambient_credentials
    }
}

/// Builds a transport client for a resolved options set.
pub trait TransportClientBuilder: Send + Sync {
    /// Construct a client configured per the options.
    fn build(&self, options: &Options) -> Result<TransportClient, HttpTaskError>;
}

/// Production transport builder backed by `reqwest`.
pub struct ReqwestTransportBuilder {
    store: Arc<dyn CertificateStore>,
}

impl ReqwestTransportBuilder {
    /// Builder using the default directory-backed certificate store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(DirectoryCertificateStore::from_env()))
    }

    /// Builder using an explicit certificate store.
    pub fn with_store(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportClientBuilder for ReqwestTransportBuilder {
    fn build(&self, options: &Options) -> Result<TransportClient, HttpTaskError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .redirect(if options.follow_redirects {
                redirect::Policy::default()
            } else {
                redirect::Policy::none()
            })
            .cookie_store(options.automatic_cookie_handling)
            .default_headers(default_headers());

        if options.allow_invalid_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let mut credentials = None;
        let mut ambient_credentials = false;
        match options.authentication {
            Authentication::WindowsIntegratedSecurity => {
                ambient_credentials = true;
            }
            Authentication::WindowsAuthentication => {
                credentials = Some(parse_domain_credentials(options)?);
            }
            Authentication::ClientCertificate => {
                let material = certs::resolve(options, self.store.as_ref())?;
                builder = builder.identity(material.into_identity()?);
            }
            _ => {}
        }

        debug!(
            authentication = ?options.authentication,
            timeout_seconds = options.timeout_seconds,
            follow_redirects = options.follow_redirects,
            cookies = options.automatic_cookie_handling,
            "building transport client"
        );

        let inner = builder.build().map_err(|e| {
            HttpTaskError::configuration(format!("failed to construct http client: {e}"))
        })?;
        Ok(TransportClient::new(inner, credentials, ambient_credentials))
    }
}

/// Client-wide default headers. Per-request headers override these.
/// `Expect: 100-continue` is never sent; reqwest does not emit it.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(defaults::http::CONTENT_TYPE),
    );
    headers
}

/// Split a `domain\user` username into explicit network credentials.
fn parse_domain_credentials(options: &Options) -> Result<NetworkCredentials, HttpTaskError> {
    let parts: Vec<&str> = options.username.split('\\').collect();
    let [domain, username] = parts.as_slice() else {
        return Err(HttpTaskError::configuration(format!(
            "username needs to be 'domain\\username', now it was '{}'",
            options.username
        )));
    };
    Ok(NetworkCredentials {
        domain: (*domain).to_string(),
        username: (*username).to_string(),
        password: options.password.clone(),
    })
}
