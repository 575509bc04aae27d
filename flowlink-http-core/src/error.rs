//! Error handling for the HTTP task engine.
//!
//! One library error type is shared by the engine and every task adapter.
//! There are no retries anywhere in this system: each variant is a terminal
//! outcome for its call.

/// Errors produced by the HTTP task engine.
#[derive(Debug, thiserror::Error)]
pub enum HttpTaskError {
    /// Invalid caller-supplied configuration, detected before any network
    /// I/O: empty URL, malformed `domain\user`, missing certificate locator,
    /// or a destination-file precondition.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No certificate with the given thumbprint exists in the personal
    /// certificate store.
    #[error("certificate with thumbprint '{thumbprint}' not found in the personal certificate store")]
    CertificateNotFound {
        /// The normalized thumbprint that was looked up.
        thumbprint: String,
    },

    /// Certificate material could not be read or imported.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// The request was interrupted by the transport layer, most likely the
    /// client-wide timeout. Distinct from [`HttpTaskError::Canceled`].
    #[error("request to '{url}' was canceled, most likely due to a timeout")]
    Timeout {
        /// Target URL of the timed-out request.
        url: String,
        /// The underlying transport failure.
        #[source]
        source: reqwest::Error,
    },

    /// The caller's cancellation token was signaled.
    #[error("request was canceled")]
    Canceled,

    /// The response body could not be parsed into a structured value. The
    /// message carries the offending text verbatim.
    #[error("unable to read response message as json: {raw}")]
    ResponseParse {
        /// Raw response text that failed to parse.
        raw: String,
    },

    /// Non-success status with `throw_on_error_response` set.
    #[error("request to '{url}' failed with status code {status}. Response body: {body}")]
    ErrorResponse {
        /// Target URL of the failed request.
        url: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Materialized response body text.
        body: String,
    },

    /// Transport-level failure (connect, TLS, reading the body).
    #[error("http error: {0}")]
    Transport(String),

    /// Filesystem failure while reading an upload source or writing a
    /// download destination.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpTaskError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a certificate error.
    pub fn certificate(message: impl Into<String>) -> Self {
        Self::Certificate(message.into())
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// True when the failure came from the caller's own cancellation token.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// True when the failure was a transport-level timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
