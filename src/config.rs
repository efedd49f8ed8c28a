//! Configuration types for the pager
//!
//! This module contains the paging thresholds, the header names the engine
//! reads, and the client file format loaded from YAML or JSON.

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Version value meaning "no explicit version requested"
pub const DEFAULT_VERSION: &str = "";

/// Caller page sizes at or below this let the engine pick the page size
pub const DEFAULT_PAGE_SIZE: u64 = 0;

/// Page size used when neither the probe body nor headers say otherwise
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 500;

/// Header carrying the total number of matching records
pub const HDR_TOTAL_COUNT: &str = "x-total-count";

/// Header carrying the server's maximum page size
pub const HDR_MAX_PAGE_SIZE: &str = "x-max-page-size";

// ============================================================================
// Paging Config
// ============================================================================

/// Thresholds and header names used while resolving a paging operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Caller page sizes <= this value are resolved by the engine
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Fallback page size when nothing better is known
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Name of the total-count response header
    #[serde(default = "default_total_count_header")]
    pub total_count_header: String,

    /// Name of the max-page-size response header
    #[serde(default = "default_max_page_size_header")]
    pub max_page_size_header: String,

    /// Version used when the caller does not supply one
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Media type for versioned requests; `{version}` is substituted
    #[serde(default = "default_media_type_template")]
    pub media_type_template: String,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            total_count_header: default_total_count_header(),
            max_page_size_header: default_max_page_size_header(),
            default_version: default_version(),
            media_type_template: default_media_type_template(),
        }
    }
}

impl PagingConfig {
    /// Set the configured maximum page size
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Set the default page size threshold
    #[must_use]
    pub fn with_default_page_size(mut self, default_page_size: u64) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    /// Media type to send in the `Accept` header for a version
    pub fn media_type(&self, version: &str) -> String {
        let version = version.trim();
        if version.is_empty() {
            "application/json".to_string()
        } else if version.contains('/') {
            // Already a full media type
            version.to_string()
        } else {
            self.media_type_template.replace("{version}", version)
        }
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u64 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_total_count_header() -> String {
    HDR_TOTAL_COUNT.to_string()
}

fn default_max_page_size_header() -> String {
    HDR_MAX_PAGE_SIZE.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_media_type_template() -> String {
    "application/vnd.hedtech.integration.v{version}+json".to_string()
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            rate_limit: RateLimitConfig::default(),
            headers: HashMap::new(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether requests are rate limited at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_rps")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            requests_per_second: default_rps(),
            burst_size: default_rps(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Client Config (file format)
// ============================================================================

/// Complete client configuration loaded from YAML or JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the remote API
    pub base_url: String,

    /// Path segment for filtered GET listings
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Path segment for QAPI POST requests
    #[serde(default = "default_qapi_path")]
    pub qapi_path: String,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Paging thresholds
    #[serde(default)]
    pub paging: PagingConfig,
}

fn default_api_path() -> String {
    "api".to_string()
}

fn default_qapi_path() -> String {
    "qapi".to_string()
}

impl ClientConfig {
    /// Create a config with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_path: default_api_path(),
            qapi_path: default_qapi_path(),
            http: HttpConfig::default(),
            paging: PagingConfig::default(),
        }
    }

    /// Parse a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            let config: Self = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        if self.paging.max_page_size == 0 {
            return Err(Error::config("paging.max_page_size must be greater than zero"));
        }
        Ok(())
    }

    /// Build the HTTP client settings described by this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder =
            HttpClientConfig::builder().timeout(Duration::from_secs(self.http.timeout_seconds));

        builder = if self.http.rate_limit.enabled {
            builder.rate_limit(RateLimiterConfig::new(
                self.http.rate_limit.requests_per_second,
                self.http.rate_limit.burst_size,
            ))
        } else {
            builder.no_rate_limit()
        };

        for (key, value) in &self.http.headers {
            builder = builder.header(key, value);
        }
        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }
}
