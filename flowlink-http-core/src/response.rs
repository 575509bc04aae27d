//! Response materialization.
//!
//! Converts a raw transport response into the caller-facing result shape:
//! plain text, a parsed JSON value, or raw bytes, plus the combined header
//! map and status code. The throw-on-error policy is applied here, after
//! materialization, so the failure message can carry the response body.

use std::collections::HashMap;

use reqwest::header::HeaderMap;

use crate::error::HttpTaskError;
use crate::headers::charset_of;
use crate::types::Options;

/// Requested shape of the materialized body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// Raw decoded text.
    Text,
    /// Text parsed as a JSON value.
    Json,
    /// Raw bytes.
    Bytes,
}

/// Materialized body variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded text; empty body decodes to the empty string.
    Text(String),
    /// Parsed JSON; an empty body materializes as an explicit empty string
    /// value, never null.
    Json(serde_json::Value),
    /// Raw bytes; empty is valid.
    Bytes(Vec<u8>),
}

impl ResponseBody {
    /// The body as text, when it has a textual representation.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(value) => value.as_str(),
            Self::Bytes(_) => None,
        }
    }

    /// The body as raw bytes, when the byte format was requested.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Consume into text. Byte bodies decode lossily; structured bodies
    /// render back to their JSON text.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(serde_json::Value::String(text)) => text,
            Self::Json(value) => value.to_string(),
            Self::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Consume into raw bytes regardless of variant.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// Caller-facing result of one HTTP call.
#[derive(Debug, Clone)]
pub struct MaterializedResponse {
    /// Numeric HTTP status code.
    pub status_code: u16,
    /// Combined response headers; multi-valued headers join with ";".
    pub headers: HashMap<String, String>,
    /// Response content type, when the server declared one.
    pub content_type: Option<String>,
    /// Materialized body.
    pub body: ResponseBody,
}

impl MaterializedResponse {
    /// Body size in megabytes, rounded to three decimals. Zero for an empty
    /// or non-byte body.
    pub fn body_size_in_megabytes(&self) -> f64 {
        match &self.body {
            ResponseBody::Bytes(bytes) => size_in_megabytes(bytes.len()),
            _ => 0.0,
        }
    }
}

/// Convert a raw response into the requested result shape and apply the
/// error-status policy.
pub async fn materialize(
    response: reqwest::Response,
    format: BodyFormat,
    options: &Options,
    url: &str,
) -> Result<MaterializedResponse, HttpTaskError> {
    let status = response.status();
    let headers = header_map(response.headers());
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let declared_charset = content_type.as_deref().and_then(charset_of);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| HttpTaskError::transport(e.to_string()))?;

    let body = match format {
        BodyFormat::Text => ResponseBody::Text(decode_text(
            &bytes,
            declared_charset.as_deref(),
            options.allow_invalid_response_charset,
        )?),
        BodyFormat::Json => {
            let text = decode_text(
                &bytes,
                declared_charset.as_deref(),
                options.allow_invalid_response_charset,
            )?;
            ResponseBody::Json(parse_json_body(&text)?)
        }
        BodyFormat::Bytes => ResponseBody::Bytes(bytes.to_vec()),
    };

    let materialized = MaterializedResponse {
        status_code: status.as_u16(),
        headers,
        content_type,
        body,
    };

    if !status.is_success() && options.throw_on_error_response {
        let body_text = match &materialized.body {
            ResponseBody::Text(text) => text.clone(),
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        return Err(HttpTaskError::ErrorResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body: body_text,
        });
    }

    Ok(materialized)
}

/// Parse response text as JSON. Empty or whitespace text materializes as an
/// explicit empty string value; malformed text fails with the offending text
/// in the error.
pub fn parse_json_body(text: &str) -> Result<serde_json::Value, HttpTaskError> {
    if text.trim().is_empty() {
        return Ok(serde_json::Value::String(String::new()));
    }
    serde_json::from_str(text).map_err(|_| HttpTaskError::ResponseParse {
        raw: text.to_string(),
    })
}

/// Combined header map; values of repeated header names join with ";".
pub fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::with_capacity(headers.len());
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(";");
        map.insert(name.as_str().to_string(), joined);
    }
    map
}

/// Body size in megabytes, rounded to three decimals.
pub fn size_in_megabytes(len: usize) -> f64 {
    let megabytes = len as f64 / (1024.0 * 1024.0);
    (megabytes * 1000.0).round() / 1000.0
}

/// Decode body bytes per the response's declared charset. A charset label
/// nothing recognizes fails the decode, unless `ignore_declared_charset` is
/// set: that discards the annotation entirely and decodes as UTF-8,
/// replacing invalid sequences.
fn decode_text(
    bytes: &[u8],
    declared_charset: Option<&str>,
    ignore_declared_charset: bool,
) -> Result<String, HttpTaskError> {
    if ignore_declared_charset {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }
    match declared_charset {
        Some(label) => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (text, _, _) = encoding.decode(bytes);
                Ok(text.into_owned())
            }
            None => Err(HttpTaskError::transport(format!(
                "response declared an invalid charset '{label}'"
            ))),
        },
        None => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}
