//! Request descriptor and response snapshot types

use super::form::FormParams;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::{Method, StatusCode};
use url::Url;

/// Body of an outbound request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw text: JSON or form-encoded
    Text(String),
    /// Structured form parameters, sent urlencoded
    Form(FormParams),
    /// Structured form fields, sent as multipart
    Fields(FormParams),
    /// Opaque bytes, never inspected
    Binary(Bytes),
}

/// A body interpreted for key lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(JsonValue),
    Params(FormParams),
}

impl RequestBody {
    /// Interpret the body for pagination key lookup.
    ///
    /// Text starting with `{` or `[` must be valid JSON; any other text is
    /// read as form-encoded. Binary bodies and invalid JSON yield `None`.
    pub fn parse(&self) -> Option<ParsedBody> {
        match self {
            RequestBody::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    serde_json::from_str(trimmed).ok().map(ParsedBody::Json)
                } else {
                    Some(ParsedBody::Params(FormParams::parse(trimmed)))
                }
            }
            RequestBody::Form(params) | RequestBody::Fields(params) => {
                Some(ParsedBody::Params(params.clone()))
            }
            RequestBody::Binary(_) => None,
        }
    }

    /// Body rendered as text, for logging and export replay
    pub fn to_text(&self) -> Option<String> {
        match self {
            RequestBody::Text(text) => Some(text.clone()),
            RequestBody::Form(params) | RequestBody::Fields(params) => {
                Some(params.to_urlencoded())
            }
            RequestBody::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok(),
        }
    }
}

/// Snapshot of an outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    /// Create a descriptor from a method and absolute URL
    pub fn new(method: Method, url: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            method,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Create a GET descriptor
    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Create a POST descriptor with a body
    pub fn post(url: &str, body: RequestBody) -> Result<Self> {
        Ok(Self::new(Method::POST, url)?.with_body(body))
    }

    /// Add or replace a header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.set_header(name, value)?;
        Ok(self)
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Add or replace a header in place
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_request(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_request(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Header value as text (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First query parameter value for a key
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Query string as ordered parameters
    pub fn query_params(&self) -> FormParams {
        FormParams::from_pairs(self.url.query_pairs().into_owned())
    }

    /// Replace the whole query string
    pub fn set_query_params(&mut self, params: &FormParams) {
        if params.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(&params.to_urlencoded()));
        }
    }

    /// Whether the method may carry a body
    pub fn allows_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }
}

/// Snapshot of a received response
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseSnapshot {
    /// Create a response snapshot
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a 200 response carrying a JSON payload
    pub fn json(payload: &JsonValue) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::new(StatusCode::OK, headers, payload.to_string())
    }

    /// Add or replace a header (invalid values are ignored)
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body parsed as JSON, `None` when it is not JSON
    pub fn json_body(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Replace the body with a JSON payload, dropping the stale length
    #[must_use]
    pub fn with_json_body(mut self, payload: &JsonValue) -> Self {
        self.body = Bytes::from(payload.to_string());
        self.headers.remove(CONTENT_LENGTH);
        self
    }
}
