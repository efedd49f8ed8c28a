//! Response envelope
//!
//! The engine reads status, body and headers of each fetch through this
//! type. It never builds envelopes itself; transports do.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::warn;

/// Status, body and headers of one fetch
#[derive(Debug, Clone, Default)]
pub struct ResponseEnvelope {
    /// HTTP status code
    pub status: u16,
    /// Raw body text, possibly empty
    pub body: String,
    /// Response headers (case-insensitive lookup)
    pub headers: HeaderMap,
}

impl ResponseEnvelope {
    /// Create an envelope with no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Create an envelope from parts
    pub fn from_parts(status: u16, body: String, headers: HeaderMap) -> Self {
        Self {
            status,
            body,
            headers,
        }
    }

    /// Add a header; invalid names or values are skipped
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!("Skipping invalid header {name:?}"),
        }
        self
    }

    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Look up a header and parse it as an unsigned integer
    ///
    /// Absent or unparseable headers yield `None`.
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|s| s.trim().parse().ok())
    }

    /// Check whether the body holds anything other than whitespace
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Number of elements in a JSON array body
    ///
    /// Returns `None` for blank bodies, invalid JSON, and non-array JSON.
    pub fn record_count(&self) -> Option<usize> {
        if !self.has_body() {
            return None;
        }
        match serde_json::from_str::<Value>(&self.body) {
            Ok(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    /// Parse the body as JSON
    pub fn json(&self) -> crate::Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
