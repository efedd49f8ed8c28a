//! Count and page-size resolution
//!
//! One probe request tells the engine how many records match and how many
//! the server returns per page.

use super::types::PagingContext;
use crate::config::PagingConfig;
use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::http::{version_headers, ResponseEnvelope, Transport, UrlBuilder};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Fallback Probe
// ============================================================================

/// Source of the total count for unfiltered operations
#[async_trait]
pub trait TotalCountProbe: Send + Sync {
    /// Total number of records in the resource
    async fn total_count(&self, resource: &str, version: &str) -> Result<u64>;
}

/// Reads the total-count header from a GET of the plain resource listing
pub struct HeaderCountProbe {
    transport: Arc<dyn Transport>,
    urls: Arc<dyn UrlBuilder>,
    config: PagingConfig,
}

impl HeaderCountProbe {
    /// Create a probe using the given transport and URL builder
    pub fn new(
        transport: Arc<dyn Transport>,
        urls: Arc<dyn UrlBuilder>,
        config: PagingConfig,
    ) -> Self {
        Self {
            transport,
            urls,
            config,
        }
    }
}

#[async_trait]
impl TotalCountProbe for HeaderCountProbe {
    async fn total_count(&self, resource: &str, version: &str) -> Result<u64> {
        let headers = version_headers(version, &self.config, false)?;
        let url = self.urls.resource_url(resource);
        let response = self.transport.get(&url, &headers).await?;
        read_total_count(&response, &self.config.total_count_header)
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Populates a `PagingContext` with total count and page size
pub struct CountAndSizeResolver<'a> {
    transport: &'a dyn Transport,
    urls: &'a dyn UrlBuilder,
    fallback: &'a dyn TotalCountProbe,
    config: &'a PagingConfig,
}

impl<'a> CountAndSizeResolver<'a> {
    /// Create a resolver
    pub fn new(
        transport: &'a dyn Transport,
        urls: &'a dyn UrlBuilder,
        fallback: &'a dyn TotalCountProbe,
        config: &'a PagingConfig,
    ) -> Self {
        Self {
            transport,
            urls,
            fallback,
            config,
        }
    }

    /// Resolve total count and page size for a context
    ///
    /// On success `total_count` is set and `page_size` holds the resolved
    /// value. Fails if the probe fails or lacks the total-count header.
    pub async fn populate(&self, mut context: PagingContext) -> Result<PagingContext> {
        if context.version.is_none() {
            context.version = Some(self.config.default_version.clone());
        }
        if context.offset < 1 {
            if context.offset < 0 {
                warn!(
                    "Negative offset {} for {} treated as 0",
                    context.offset, context.resource_name
                );
            }
            context.offset = 0;
        }

        let (total_count, probe) = match &context.filter {
            Some(filter) => {
                let (total, response) = self
                    .probe_total_count(&context.resource_name, context.version(), filter)
                    .await?;
                (total, Some(response))
            }
            None => {
                debug!(
                    "No filter for {}, using fallback count probe",
                    context.resource_name
                );
                let total = self
                    .fallback
                    .total_count(&context.resource_name, context.version())
                    .await?;
                (total, None)
            }
        };

        context.total_count = Some(total_count);
        context.page_size = resolve_page_size(
            context.page_size,
            self.config.default_page_size,
            probe.as_ref(),
            &self.config.max_page_size_header,
            self.config.max_page_size,
        );

        // Encoding happens only once count and size are known
        context.encoded_filter = context
            .filter
            .as_ref()
            .filter(|f| !f.is_post())
            .map(FilterSpec::encoded);
        context.last_probe_response = probe;

        debug!(
            "Resolved {}: total_count={}, page_size={}",
            context.resource_name, total_count, context.page_size
        );
        Ok(context)
    }

    /// Issue one probe request for a filter and read its total count
    pub async fn probe_total_count(
        &self,
        resource: &str,
        version: &str,
        filter: &FilterSpec,
    ) -> Result<(u64, ResponseEnvelope)> {
        debug!("Probing {} with {} filter", resource, filter.kind());
        let headers = version_headers(version, self.config, filter.is_post())?;
        let response = match filter {
            FilterSpec::QapiBody(body) => {
                let url = self.urls.qapi_url(resource);
                self.transport.post(&url, &headers, body).await?
            }
            _ => {
                let url = self.urls.filter_url(resource, &filter.encoded());
                self.transport.get(&url, &headers).await?
            }
        };

        let total = read_total_count(&response, &self.config.total_count_header)?;
        Ok((total, response))
    }
}

/// Read the total-count header
///
/// A missing or non-integer header is an error: the count bounds the page loop.
pub fn read_total_count(response: &ResponseEnvelope, header: &str) -> Result<u64> {
    response
        .header_u64(header)
        .ok_or_else(|| Error::missing_header(header))
}

/// Decide the page size for an operation
///
/// Caller sizes above `default_threshold` win. Otherwise, in order: the
/// configured maximum when there was no probe, the probe body's array
/// length, the max-page-size header, the configured maximum.
pub fn resolve_page_size(
    caller_page_size: u64,
    default_threshold: u64,
    probe: Option<&ResponseEnvelope>,
    max_page_size_header: &str,
    configured_max: u64,
) -> u64 {
    if caller_page_size > default_threshold {
        return caller_page_size;
    }

    let Some(probe) = probe else {
        return configured_max;
    };

    if probe.has_body() {
        match probe.record_count() {
            Some(count) => return count as u64,
            None => warn!("Probe body is not a JSON array, falling back to headers"),
        }
    }

    probe
        .header_u64(max_page_size_header)
        .unwrap_or(configured_max)
}
