//! Paging engine
//!
//! Entry point that validates a query, resolves it with one probe, and
//! either returns a single page or drains every page.

use super::driver::PagingDriver;
use super::resolver::{CountAndSizeResolver, HeaderCountProbe, TotalCountProbe};
use super::types::{PageQuery, PagingContext};
use crate::config::{ClientConfig, PagingConfig};
use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::http::{EndpointBuilder, HttpClient, ResponseEnvelope, Transport, UrlBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves paging queries against a transport
pub struct PagingEngine {
    transport: Arc<dyn Transport>,
    urls: Arc<dyn UrlBuilder>,
    fallback: Option<Arc<dyn TotalCountProbe>>,
    config: PagingConfig,
}

impl PagingEngine {
    /// Create an engine with the default paging config
    pub fn new(transport: Arc<dyn Transport>, urls: Arc<dyn UrlBuilder>) -> Self {
        Self {
            transport,
            urls,
            fallback: None,
            config: PagingConfig::default(),
        }
    }

    /// Create an engine backed by `HttpClient` from a client config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpClient::with_config(config.http_client_config())?;
        let urls = EndpointBuilder::from_config(config)?;
        Ok(Self::new(Arc::new(transport), Arc::new(urls)).with_config(config.paging.clone()))
    }

    /// Set the paging config
    #[must_use]
    pub fn with_config(mut self, config: PagingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the probe used for unfiltered total counts
    #[must_use]
    pub fn with_fallback_probe(mut self, probe: Arc<dyn TotalCountProbe>) -> Self {
        self.fallback = Some(probe);
        self
    }

    /// Get the paging config
    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// Fetch every page matching a query
    ///
    /// Returns one envelope when everything fits in a single page, otherwise
    /// one envelope per page in ascending offset order.
    pub async fn resolve(&self, query: &PageQuery) -> Result<Vec<ResponseEnvelope>> {
        validate(query)?;
        info!(
            "Resolving {} ({})",
            query.resource_name,
            query
                .filter
                .as_ref()
                .map_or_else(|| "unfiltered".to_string(), |f| f.kind().to_string())
        );

        let fallback = self.fallback_probe();
        let resolver = CountAndSizeResolver::new(
            self.transport.as_ref(),
            self.urls.as_ref(),
            fallback.as_ref(),
            &self.config,
        );
        let context = resolver
            .populate(PagingContext::from_query(query))
            .await?
            .evaluate_should_page();

        let driver = PagingDriver::new(self.transport.as_ref(), self.urls.as_ref(), &self.config);

        if !context.should_page {
            debug!("{} fits in a single page", context.resource_name);
            return Ok(vec![self.single_page(&driver, context).await?]);
        }

        // should_page implies a known total count
        let total_count = context.total_count.unwrap_or_default();
        let pages = driver
            .drain_from(
                &context.resource_name,
                context.version(),
                &context.payload(),
                total_count,
                context.page_size,
                context.start_offset(),
            )
            .await?;

        info!(
            "Fetched {} pages of {} for {} ({} records)",
            pages.len(),
            context.page_size,
            context.resource_name,
            total_count
        );
        Ok(pages)
    }

    /// Total number of records matching a filter
    ///
    /// An absent resource name or filter yields 0 without any request; a
    /// blank one is rejected like in `resolve`.
    pub async fn total_count(
        &self,
        resource_name: Option<&str>,
        version: Option<&str>,
        filter: Option<&FilterSpec>,
    ) -> Result<u64> {
        let (Some(resource), Some(filter)) = (resource_name, filter) else {
            return Ok(0);
        };
        if resource.trim().is_empty() {
            return Err(Error::invalid_argument("resource name must not be blank"));
        }
        if filter.is_blank() {
            return Err(Error::invalid_argument("filter text must not be blank"));
        }

        let fallback = self.fallback_probe();
        let resolver = CountAndSizeResolver::new(
            self.transport.as_ref(),
            self.urls.as_ref(),
            fallback.as_ref(),
            &self.config,
        );
        let version = version.unwrap_or(self.config.default_version.as_str());
        let (total, _) = resolver.probe_total_count(resource, version, filter).await?;
        Ok(total)
    }

    /// Total number of records in an unfiltered resource, via the fallback probe
    pub async fn resource_total_count(
        &self,
        resource_name: &str,
        version: Option<&str>,
    ) -> Result<u64> {
        if resource_name.trim().is_empty() {
            return Err(Error::invalid_argument("resource name must not be blank"));
        }
        let version = version.unwrap_or(self.config.default_version.as_str());
        self.fallback_probe().total_count(resource_name, version).await
    }

    /// Page for an operation that needs no paging
    ///
    /// The probe already holds it when starting at offset 0; otherwise one
    /// direct fetch at the requested offset is made.
    async fn single_page(
        &self,
        driver: &PagingDriver<'_>,
        mut context: PagingContext,
    ) -> Result<ResponseEnvelope> {
        let start = context.start_offset();
        if start == 0 {
            if let Some(probe) = context.last_probe_response.take() {
                return Ok(probe);
            }
        }

        let limit = if context.page_size > 0 {
            context.page_size
        } else {
            self.config.max_page_size
        };
        driver
            .fetch_page(
                &context.resource_name,
                context.version(),
                &context.payload(),
                start,
                limit,
            )
            .await
    }

    fn fallback_probe(&self) -> Arc<dyn TotalCountProbe> {
        match &self.fallback {
            Some(probe) => Arc::clone(probe),
            None => Arc::new(HeaderCountProbe::new(
                Arc::clone(&self.transport),
                Arc::clone(&self.urls),
                self.config.clone(),
            )),
        }
    }
}

impl std::fmt::Debug for PagingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagingEngine")
            .field("config", &self.config)
            .field("has_fallback_probe", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

/// Argument checks made before any request
fn validate(query: &PageQuery) -> Result<()> {
    if query.resource_name.trim().is_empty() {
        return Err(Error::invalid_argument("resource name must not be blank"));
    }
    if query.filter.as_ref().is_some_and(FilterSpec::is_blank) {
        return Err(Error::invalid_argument("filter text must not be blank"));
    }
    Ok(())
}
