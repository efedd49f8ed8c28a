//! Offset-advancing page fetches
//!
//! Given a resolved count and page size, the driver issues one request per
//! page in ascending offset order and collects the envelopes.

use super::types::FilterPayload;
use crate::config::PagingConfig;
use crate::error::{Error, Result};
use crate::http::{version_headers, ResponseEnvelope, Transport, UrlBuilder};
use reqwest::header::HeaderMap;
use tracing::debug;

/// Number of pages needed to cover `total_count - start_offset` records
///
/// Zero when the start offset is at or past the end, or the page size is 0.
pub fn page_count(total_count: u64, page_size: u64, start_offset: u64) -> u64 {
    if page_size == 0 || total_count <= start_offset {
        return 0;
    }
    ((total_count - start_offset) as f64 / page_size as f64).ceil() as u64
}

/// Offset of page `index`, or an error if it does not fit in a `u64`
pub(crate) fn page_offset(start_offset: u64, index: u64, page_size: u64) -> Result<u64> {
    index
        .checked_mul(page_size)
        .and_then(|skip| start_offset.checked_add(skip))
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "offset of page {index} (size {page_size}, start {start_offset}) overflows"
            ))
        })
}

/// Fetches every page of a resolved operation
pub struct PagingDriver<'a> {
    transport: &'a dyn Transport,
    urls: &'a dyn UrlBuilder,
    config: &'a PagingConfig,
}

impl<'a> PagingDriver<'a> {
    /// Create a driver
    pub fn new(
        transport: &'a dyn Transport,
        urls: &'a dyn UrlBuilder,
        config: &'a PagingConfig,
    ) -> Self {
        Self {
            transport,
            urls,
            config,
        }
    }

    /// Fetch all pages from `start_offset` to `total_count`
    ///
    /// Page `i` is requested at `start_offset + i * page_size`. The first
    /// failed fetch aborts the drain and no pages are returned.
    pub async fn drain_from(
        &self,
        resource: &str,
        version: &str,
        payload: &FilterPayload,
        total_count: u64,
        page_size: u64,
        start_offset: u64,
    ) -> Result<Vec<ResponseEnvelope>> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize { page_size });
        }

        let num_pages = page_count(total_count, page_size, start_offset);
        debug!(
            "Draining {resource}: {num_pages} pages of {page_size} from offset {start_offset}"
        );

        let headers = version_headers(version, self.config, payload.is_post())?;
        // The page count comes from a server header, so it does not size the buffer
        let mut pages = Vec::new();
        for i in 0..num_pages {
            let offset = page_offset(start_offset, i, page_size)?;
            let page = self
                .fetch(resource, &headers, payload, offset, page_size)
                .await?;
            pages.push(page);
        }

        Ok(pages)
    }

    /// Fetch a single page at an offset
    pub async fn fetch_page(
        &self,
        resource: &str,
        version: &str,
        payload: &FilterPayload,
        offset: u64,
        limit: u64,
    ) -> Result<ResponseEnvelope> {
        let headers = version_headers(version, self.config, payload.is_post())?;
        self.fetch(resource, &headers, payload, offset, limit).await
    }

    async fn fetch(
        &self,
        resource: &str,
        headers: &HeaderMap,
        payload: &FilterPayload,
        offset: u64,
        limit: u64,
    ) -> Result<ResponseEnvelope> {
        debug!("Fetching {resource} page at offset {offset}, limit {limit}");
        match payload {
            FilterPayload::Unfiltered => {
                let url = self.urls.resource_page_url(resource, offset, limit);
                self.transport.get(&url, headers).await
            }
            FilterPayload::Query(filter) => {
                let url = self.urls.filter_page_url(resource, filter, offset, limit);
                self.transport.get(&url, headers).await
            }
            FilterPayload::QapiBody(body) => {
                let url = self.urls.qapi_page_url(resource, offset, limit);
                self.transport.post(&url, headers, body).await
            }
        }
    }
}
