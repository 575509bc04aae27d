//! Request execution.
//!
//! One outbound call per invocation: obtain a client from the cache, build
//! the request, send it, and normalize transport-level failures. There is no
//! retry, backoff, or circuit breaking anywhere in the engine; every failure
//! is a single terminal outcome for its call.

use std::sync::Arc;

use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::cache::ClientCache;
use crate::error::HttpTaskError;
use crate::headers::{self, compose_headers};
use crate::response::{self, BodyFormat, MaterializedResponse};
use crate::transport::{ReqwestTransportBuilder, TransportClientBuilder};
use crate::types::{Options, RequestContent, RequestSpec};

/// The shared HTTP execution engine. Task adapters own one engine apiece;
/// the engine owns the client cache and receives the transport builder as an
/// explicit dependency.
pub struct Engine {
    cache: ClientCache,
}

impl Engine {
    /// Engine backed by the production reqwest transport.
    pub fn new() -> Self {
        Self::with_builder(Arc::new(ReqwestTransportBuilder::new()))
    }

    /// Engine backed by an injected transport builder.
    pub fn with_builder(builder: Arc<dyn TransportClientBuilder>) -> Self {
        Self {
            cache: ClientCache::new(builder),
        }
    }

    /// Engine with full control over the cache, for tests that tune expiry.
    pub fn with_cache(cache: ClientCache) -> Self {
        Self { cache }
    }

    /// Drop every cached transport client. Subsequent calls rebuild clients
    /// from their options.
    pub fn clear_client_cache(&self) {
        self.cache.clear();
    }

    /// Issue one HTTP call and return the raw transport response. The
    /// response is not yet materialized and the error-status policy has not
    /// been applied; see [`Engine::execute`] for the full pipeline.
    pub async fn send(
        &self,
        spec: &RequestSpec,
        options: &Options,
        cancellation: &CancellationToken,
    ) -> Result<reqwest::Response, HttpTaskError> {
        // URL validation happens before any client or cache interaction.
        if spec.url.trim().is_empty() {
            return Err(HttpTaskError::configuration("url can not be empty"));
        }
        if cancellation.is_cancelled() {
            return Err(HttpTaskError::Canceled);
        }

        let client = self.cache.get_or_create(options)?;
        let composed = compose_headers(&spec.headers, options);

        let mut request = client.http().request(spec.method.into(), &spec.url);

        // Domain credentials ride on the client; a composed Authorization
        // header still wins.
        if let Some(credentials) = client.credentials()
            && headers::header_value(&composed, "authorization").is_none()
        {
            request = request.basic_auth(
                format!("{}\\{}", credentials.domain, credentials.username),
                Some(&credentials.password),
            );
        }

        request = request.headers(headers::to_header_map(&composed));

        // Only body-carrying verbs get content; anything supplied for other
        // verbs is dropped before the request is built.
        if spec.method.allows_body() {
            request = match &spec.content {
                RequestContent::Empty => request,
                RequestContent::Text(text) => {
                    let content_type = headers::header_value(&composed, "content-type");
                    request.body(encode_text_body(text, content_type))
                }
                RequestContent::Bytes(bytes) => request.body(bytes.clone()),
                RequestContent::File(path) => {
                    let file = tokio::fs::File::open(path).await?;
                    request.body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
                }
            };
        }

        let request_id = Uuid::new_v4();
        debug!(
            request_id = %request_id,
            method = %spec.method,
            url = %spec.url,
            "sending request"
        );

        let response = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(HttpTaskError::Canceled),
            result = request.send() => {
                result.map_err(|e| classify_send_error(e, &spec.url, cancellation))?
            }
        };

        debug!(
            request_id = %request_id,
            status = response.status().as_u16(),
            "received response"
        );
        Ok(response)
    }

    /// Issue one HTTP call and materialize the response in the requested
    /// format, applying the error-status policy.
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        options: &Options,
        format: BodyFormat,
        cancellation: &CancellationToken,
    ) -> Result<MaterializedResponse, HttpTaskError> {
        let raw = self.send(spec, options, cancellation).await?;
        if cancellation.is_cancelled() {
            return Err(HttpTaskError::Canceled);
        }
        response::materialize(raw, format, options, &spec.url).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a failed send to the library error taxonomy. An interruption caused
/// by the caller's own token propagates as cancellation; any other
/// interruption of the transport wait is a timeout.
fn classify_send_error(
    error: reqwest::Error,
    url: &str,
    cancellation: &CancellationToken,
) -> HttpTaskError {
    if cancellation.is_cancelled() {
        return HttpTaskError::Canceled;
    }
    if error.is_timeout() {
        return HttpTaskError::Timeout {
            url: url.to_string(),
            source: error,
        };
    }
    HttpTaskError::transport(error.to_string())
}

/// Encode a text body per the user content-type charset when one is declared
/// and recognized; UTF-8 otherwise.
fn encode_text_body(text: &str, content_type: Option<&str>) -> Vec<u8> {
    let charset = content_type.and_then(headers::charset_of);
    match charset.and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes())) {
        Some(encoding) => encoding.encode(text).0.into_owned(),
        None => text.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportClient;
    use crate::types::{Header, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBuilder {
        builds: AtomicUsize,
    }

    impl CountingBuilder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                builds: AtomicUsize::new(0),
            })
        }
    }

    impl TransportClientBuilder for CountingBuilder {
        fn build(&self, _options: &Options) -> Result<TransportClient, HttpTaskError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(TransportClient::new(reqwest::Client::new(), None, false))
        }
    }

    fn spec(url: &str) -> RequestSpec {
        RequestSpec {
            method: Method::Get,
            url: url.to_string(),
            headers: Vec::new(),
            content: RequestContent::Empty,
        }
    }

    #[tokio::test]
    async fn empty_url_fails_before_any_client_is_built() {
        let builder = CountingBuilder::new();
        let engine = Engine::with_builder(builder.clone());
        let err = engine
            .send(&spec(""), &Options::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpTaskError::Configuration(_)));
        assert_eq!(builder.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pre_canceled_token_short_circuits() {
        let builder = CountingBuilder::new();
        let engine = Engine::with_builder(builder.clone());
        let token = CancellationToken::new();
        token.cancel();
        let err = engine
            .send(&spec("http://localhost/endpoint"), &Options::default(), &token)
            .await
            .unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(builder.builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn charset_is_read_from_content_type_parameters() {
        assert_eq!(
            headers::charset_of("text/xml; charset=iso-8859-1"),
            Some("iso-8859-1".into())
        );
        assert_eq!(
            headers::charset_of("text/xml; boundary=x; CHARSET=\"utf-16\""),
            Some("utf-16".into())
        );
        assert_eq!(headers::charset_of("application/json"), None);
    }

    #[test]
    fn text_bodies_follow_the_declared_charset() {
        let latin = encode_text_body("häst", Some("text/plain; charset=iso-8859-1"));
        assert_eq!(latin, vec![b'h', 0xE4, b's', b't']);

        let utf8 = encode_text_body("häst", Some("text/plain"));
        assert_eq!(utf8, "häst".as_bytes());

        let unknown = encode_text_body("häst", Some("text/plain; charset=bogus-name"));
        assert_eq!(unknown, "häst".as_bytes());
    }

    #[test]
    fn header_spec_is_built_from_user_headers() {
        let headers = [Header::new("Accept", "application/json")];
        let composed = compose_headers(&headers, &Options::default());
        assert_eq!(headers::header_value(&composed, "ACCEPT"), Some("application/json"));
    }
}
