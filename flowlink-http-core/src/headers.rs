//! Outbound header composition.
//!
//! Builds the effective header set from user-supplied headers plus
//! authentication-derived headers. A user-supplied `Authorization` header
//! always wins; synthesis is skipped entirely when one exists under any
//! casing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::types::{Authentication, Header, Options};

const AUTHORIZATION: &str = "authorization";

/// Compose the effective outbound headers. Duplicate names collapse
/// case-insensitively, last write wins; Basic/OAuth options synthesize an
/// `Authorization` header unless the user already supplied one. Pure
/// transform, no side effects.
pub fn compose_headers(headers: &[Header], options: &Options) -> Vec<Header> {
    let mut composed: Vec<Header> = Vec::with_capacity(headers.len() + 1);
    for header in headers {
        match composed
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&header.name))
        {
            Some(existing) => existing.value = header.value.clone(),
            None => composed.push(header.clone()),
        }
    }

    let has_authorization = composed
        .iter()
        .any(|header| header.name.eq_ignore_ascii_case(AUTHORIZATION));
    if !has_authorization {
        match options.authentication {
            Authentication::Basic => {
                let credentials =
                    BASE64.encode(format!("{}:{}", options.username, options.password));
                composed.push(Header::new("Authorization", format!("Basic {credentials}")));
            }
            Authentication::OAuth => {
                composed.push(Header::new(
                    "Authorization",
                    format!("Bearer {}", options.token),
                ));
            }
            _ => {}
        }
    }

    composed
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
}

/// Charset parameter of a content-type value, when one is declared.
pub(crate) fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Convert composed headers into a transport header map. A header that
/// cannot be represented as a valid name/value pair is logged and skipped;
/// the call proceeds without it.
pub fn to_header_map(headers: &[Header]) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for header in headers {
        let name = HeaderName::from_bytes(header.name.as_bytes());
        let value = HeaderValue::from_str(&header.value);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => {
                warn!(
                    name = %header.name,
                    value = %header.value,
                    "could not add header"
                );
            }
        }
    }
    map
}
