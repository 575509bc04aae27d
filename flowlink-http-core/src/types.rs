//! Request and option types shared by every HTTP task.
//!
//! The per-task input shapes live in the task crates; this module holds the
//! engine-level request specification and the one `Options` struct all tasks
//! share.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// HTTP verb accepted by the generic request tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
    /// HEAD request.
    Head,
    /// OPTIONS request.
    Options,
}

impl Method {
    /// Whether this verb carries a request body. Verbs outside this set have
    /// their body dropped before the request is built.
    pub fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Canonical upper-case name of the verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verb accepted by the byte-sending and upload tasks, restricted to
/// the verbs that carry a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BodyMethod {
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl From<BodyMethod> for Method {
    fn from(method: BodyMethod) -> Self {
        match method {
            BodyMethod::Post => Method::Post,
            BodyMethod::Put => Method::Put,
            BodyMethod::Patch => Method::Patch,
            BodyMethod::Delete => Method::Delete,
        }
    }
}

/// A single user-supplied request header. Name comparison is
/// case-insensitive everywhere the engine handles headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Request body supplied by a task.
#[derive(Debug, Clone, Default)]
pub enum RequestContent {
    /// No body.
    #[default]
    Empty,
    /// Text body, encoded per the user content-type charset when one is
    /// declared and valid, UTF-8 otherwise.
    Text(String),
    /// Raw byte body, sent as-is.
    Bytes(Vec<u8>),
    /// A local file streamed as the request body.
    File(PathBuf),
}

/// Engine-level request specification. Task inputs map down to this.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP verb.
    pub method: Method,
    /// Target URL including any query parameters. Must be non-empty.
    pub url: String,
    /// Ordered user headers.
    pub headers: Vec<Header>,
    /// Request body; dropped for verbs where [`Method::allows_body`] is
    /// false.
    pub content: RequestContent,
}

/// How the request authenticates to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authentication {
    /// No authentication.
    #[default]
    None,
    /// Basic authentication from username/password.
    Basic,
    /// Domain credentials; `username` must be `domain\user`.
    WindowsAuthentication,
    /// Ambient credentials of the calling process.
    WindowsIntegratedSecurity,
    /// Bearer token added as an Authorization header.
    OAuth,
    /// Mutual TLS with a client certificate.
    ClientCertificate,
}

/// Where the client certificate is loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateSource {
    /// The personal certificate store, looked up by thumbprint.
    #[default]
    CertificateStore,
    /// A certificate file on disk; PKCS#12 archives and PEM bundles are
    /// supported.
    File,
    /// Certificate bytes as a base64 string.
    String,
}

/// Options shared by every HTTP task. Constructed per call and immutable for
/// the call's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Authentication mode for the request.
    pub authentication: Authentication,
    /// Username for Basic or Windows authentication. Windows authentication
    /// requires the `domain\user` form.
    pub username: String,
    /// Password paired with `username`.
    pub password: String,
    /// Bearer token for OAuth. Request-scoped: it never participates in
    /// client caching.
    pub token: String,
    /// Where the client certificate is loaded from.
    pub certificate_source: CertificateSource,
    /// Thumbprint for the certificate-store source.
    pub certificate_thumbprint: String,
    /// Path for the file source.
    pub certificate_file_path: String,
    /// Base64 certificate bytes for the string source.
    pub certificate_base64: String,
    /// Key phrase guarding the certificate material. Empty is allowed.
    pub certificate_key_phrase: String,
    /// Load the certificate's entire trust chain from the store instead of
    /// the leaf alone.
    pub load_entire_chain: bool,
    /// Timeout in seconds for the connection and operation.
    pub timeout_seconds: u64,
    /// Follow 3xx redirects automatically.
    pub follow_redirects: bool,
    /// Let the client keep a cookie jar across requests.
    pub automatic_cookie_handling: bool,
    /// Accept any server certificate, bypassing chain and hostname
    /// validation.
    pub allow_invalid_certificate: bool,
    /// Ignore the charset a response declares and decode the body as UTF-8.
    pub allow_invalid_response_charset: bool,
    /// Fail the call when the response status is outside the success range.
    pub throw_on_error_response: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            authentication: Authentication::None,
            username: String::new(),
            password: String::new(),
            token: String::new(),
            certificate_source: CertificateSource::CertificateStore,
            certificate_thumbprint: String::new(),
            certificate_file_path: String::new(),
            certificate_base64: String::new(),
            certificate_key_phrase: String::new(),
            load_entire_chain: true,
            timeout_seconds: defaults::http::TIMEOUT_SECONDS,
            follow_redirects: true,
            automatic_cookie_handling: true,
            allow_invalid_certificate: false,
            allow_invalid_response_charset: false,
            throw_on_error_response: false,
        }
    }
}

impl Options {
    /// Returns a builder for constructing `Options`.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}

/// Builder for [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Set the authentication mode.
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.options.authentication = authentication;
        self
    }

    /// Set username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.options.username = username.into();
        self.options.password = password.into();
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.options.token = token.into();
        self
    }

    /// Select the certificate source.
    pub fn certificate_source(mut self, source: CertificateSource) -> Self {
        self.options.certificate_source = source;
        self
    }

    /// Set the store thumbprint.
    pub fn certificate_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.options.certificate_thumbprint = thumbprint.into();
        self
    }

    /// Set the certificate file path.
    pub fn certificate_file_path(mut self, path: impl Into<String>) -> Self {
        self.options.certificate_file_path = path.into();
        self
    }

    /// Set the base64 certificate blob.
    pub fn certificate_base64(mut self, blob: impl Into<String>) -> Self {
        self.options.certificate_base64 = blob.into();
        self
    }

    /// Set the certificate key phrase.
    pub fn certificate_key_phrase(mut self, key_phrase: impl Into<String>) -> Self {
        self.options.certificate_key_phrase = key_phrase.into();
        self
    }

    /// Toggle trust-chain loading for store certificates.
    pub fn load_entire_chain(mut self, load: bool) -> Self {
        self.options.load_entire_chain = load;
        self
    }

    /// Set the timeout in seconds.
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.options.timeout_seconds = seconds;
        self
    }

    /// Toggle automatic redirect following.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.options.follow_redirects = follow;
        self
    }

    /// Toggle the automatic cookie jar.
    pub fn automatic_cookie_handling(mut self, automatic: bool) -> Self {
        self.options.automatic_cookie_handling = automatic;
        self
    }

    /// Toggle acceptance of invalid server certificates.
    pub fn allow_invalid_certificate(mut self, allow: bool) -> Self {
        self.options.allow_invalid_certificate = allow;
        self
    }

    /// Toggle charset-tolerant response decoding.
    pub fn allow_invalid_response_charset(mut self, allow: bool) -> Self {
        self.options.allow_invalid_response_charset = allow;
        self
    }

    /// Toggle failing on non-success response statuses.
    pub fn throw_on_error_response(mut self, throw: bool) -> Self {
        self.options.throw_on_error_response = throw;
        self
    }

    /// Build the options.
    pub fn build(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_allowed_only_for_mutating_verbs() {
        assert!(Method::Post.allows_body());
        assert!(Method::Put.allows_body());
        assert!(Method::Patch.allows_body());
        assert!(Method::Delete.allows_body());
        assert!(!Method::Get.allows_body());
        assert!(!Method::Head.allows_body());
        assert!(!Method::Options.allows_body());
    }

    #[test]
    fn body_methods_map_to_body_carrying_verbs() {
        for method in [
            BodyMethod::Post,
            BodyMethod::Put,
            BodyMethod::Patch,
            BodyMethod::Delete,
        ] {
            assert!(Method::from(method).allows_body());
        }
    }

    #[test]
    fn default_options_match_platform_defaults() {
        let options = Options::default();
        assert_eq!(options.timeout_seconds, 30);
        assert!(options.follow_redirects);
        assert!(options.automatic_cookie_handling);
        assert!(options.load_entire_chain);
        assert!(!options.throw_on_error_response);
    }

    #[test]
    fn builder_sets_fields() {
        let options = Options::builder()
            .authentication(Authentication::Basic)
            .credentials("user", "pass")
            .timeout_seconds(60)
            .throw_on_error_response(true)
            .build();
        assert_eq!(options.authentication, Authentication::Basic);
        assert_eq!(options.username, "user");
        assert_eq!(options.password, "pass");
        assert_eq!(options.timeout_seconds, 60);
        assert!(options.throw_on_error_response);
    }

    #[test]
    fn method_serializes_upper_case() {
        let json = serde_json::to_string(&Method::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }
}
