//! HTTP transport backed by reqwest
//!
//! `HttpClient` sends the absolute URLs produced by a `UrlBuilder`, applies
//! the configured rate limit and default headers, and turns every reply
//! into a `ResponseEnvelope`. Non-2xx replies and timeouts become errors.
//!
//! Failed requests are not retried; callers see the first failure.

use super::envelope::ResponseEnvelope;
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::transport::Transport;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Settings for `HttpClient`
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    /// `None` disables throttling
    pub rate_limit: Option<RateLimiterConfig>,
    /// Sent with every request; per-request headers take precedence
    pub default_headers: Vec<(String, String)>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: Vec::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for `HttpClientConfig`
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .push((name.into(), value.into()));
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// reqwest-based `Transport`
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    default_headers: HeaderMap,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Client with custom settings
    ///
    /// Fails if a default header name or value is not valid HTTP.
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let default_headers = header_map(&config.default_headers)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        let rate_limiter = config
            .rate_limit
            .as_ref()
            .and_then(RateLimiter::from_config);

        Ok(Self {
            client,
            config,
            default_headers,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Send one request to an absolute URL
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        let url = Url::parse(url)?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let mut merged = self.default_headers.clone();
        merged.extend(headers.clone());

        let mut req = self
            .client
            .request(method.clone(), url.clone())
            .headers(merged);
        if let Some(body) = body {
            req = req.body(body.to_owned());
        }

        debug!("{method} {url}");
        let response = req.send().await.map_err(|e| self.send_error(e))?;
        let envelope = collect(response).await?;

        if !(200..300).contains(&envelope.status) {
            debug!("{method} {url} failed with {}", envelope.status);
            return Err(Error::http_status(envelope.status, envelope.body));
        }
        Ok(envelope)
    }

    fn send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(err)
        }
    }
}

/// Read status, headers and body text of a reply
async fn collect(response: Response) -> Result<ResponseEnvelope> {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response.text().await?;
    Ok(ResponseEnvelope::from_parts(status, body, headers))
}

fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::config(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::config(format!("invalid value for header {name}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<ResponseEnvelope> {
        self.request(Method::GET, url, headers, None).await
    }

    async fn post(&self, url: &str, headers: &HeaderMap, body: &str) -> Result<ResponseEnvelope> {
        self.request(Method::POST, url, headers, Some(body)).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
