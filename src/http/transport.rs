//! Transport and URL-building seams
//!
//! The paging engine talks to the remote API only through these traits:
//! a `Transport` performs GET/POST requests, a `UrlBuilder` turns resource
//! names, filter text and offsets into request URLs.

use super::envelope::ResponseEnvelope;
use crate::config::{ClientConfig, PagingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use url::Url;

/// Performs requests against resource endpoints
///
/// Implementations fail with a transport error on network failure or a
/// non-2xx status. Timeouts and cancellation belong here too.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET request
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<ResponseEnvelope>;

    /// Perform a POST request with a JSON body
    async fn post(&self, url: &str, headers: &HeaderMap, body: &str) -> Result<ResponseEnvelope>;
}

/// Shapes request URLs from structured inputs
///
/// Filter text passed in is already encoded for URL embedding.
pub trait UrlBuilder: Send + Sync {
    /// Unfiltered resource listing
    fn resource_url(&self, resource: &str) -> String;

    /// Unfiltered resource listing starting at an offset
    fn resource_page_url(&self, resource: &str, offset: u64, limit: u64) -> String;

    /// Filtered listing
    fn filter_url(&self, resource: &str, filter: &str) -> String;

    /// Filtered listing starting at an offset
    fn filter_page_url(&self, resource: &str, filter: &str, offset: u64, limit: u64) -> String;

    /// QAPI endpoint for a resource
    fn qapi_url(&self, resource: &str) -> String;

    /// QAPI endpoint with explicit offset and limit
    fn qapi_page_url(&self, resource: &str, offset: u64, limit: u64) -> String;
}

// ============================================================================
// Endpoint Builder
// ============================================================================

/// Default `UrlBuilder`: `{base}/{api_path}/{resource}` and `{base}/{qapi_path}/{resource}`
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    base_url: String,
    api_path: String,
    qapi_path: String,
}

impl EndpointBuilder {
    /// Create a builder for a base URL with the default `api`/`qapi` paths
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_path: "api".to_string(),
            qapi_path: "qapi".to_string(),
        })
    }

    /// Create a builder from a client config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(&config.base_url)?.with_paths(&config.api_path, &config.qapi_path))
    }

    /// Override the listing and QAPI path segments
    #[must_use]
    pub fn with_paths(mut self, api_path: &str, qapi_path: &str) -> Self {
        self.api_path = api_path.trim_matches('/').to_string();
        self.qapi_path = qapi_path.trim_matches('/').to_string();
        self
    }

    fn join(&self, segment: &str, resource: &str) -> String {
        let resource = resource.trim_matches('/');
        if segment.is_empty() {
            format!("{}/{resource}", self.base_url)
        } else {
            format!("{}/{segment}/{resource}", self.base_url)
        }
    }
}

/// Append query text (with or without a leading `?`) to a URL
fn append_query(url: &str, query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

fn paging_query(offset: u64, limit: u64) -> String {
    format!("offset={offset}&limit={limit}")
}

impl UrlBuilder for EndpointBuilder {
    fn resource_url(&self, resource: &str) -> String {
        self.join(&self.api_path, resource)
    }

    fn resource_page_url(&self, resource: &str, offset: u64, limit: u64) -> String {
        append_query(&self.resource_url(resource), &paging_query(offset, limit))
    }

    fn filter_url(&self, resource: &str, filter: &str) -> String {
        append_query(&self.resource_url(resource), filter)
    }

    fn filter_page_url(&self, resource: &str, filter: &str, offset: u64, limit: u64) -> String {
        append_query(&self.filter_url(resource, filter), &paging_query(offset, limit))
    }

    fn qapi_url(&self, resource: &str) -> String {
        self.join(&self.qapi_path, resource)
    }

    fn qapi_page_url(&self, resource: &str, offset: u64, limit: u64) -> String {
        append_query(&self.qapi_url(resource), &paging_query(offset, limit))
    }
}

// ============================================================================
// Header Building
// ============================================================================

/// Build request headers for a version
///
/// `Accept` carries the version's media type; POST requests also get a JSON
/// `Content-Type`.
pub fn version_headers(version: &str, config: &PagingConfig, post: bool) -> Result<HeaderMap> {
    let media_type = config.media_type(version);
    let accept = HeaderValue::from_str(&media_type)
        .map_err(|_| Error::invalid_argument(format!("invalid version {version:?}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, accept);
    if post {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}
