//! Paging types
//!
//! Defines the caller-facing query and the per-call context that the
//! resolver and driver pass along.

use crate::config::DEFAULT_VERSION;
use crate::filter::FilterSpec;
use crate::http::ResponseEnvelope;

/// A request to page through a resource collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Resource name, e.g. `persons`
    pub resource_name: String,
    /// Requested version; `None` uses the configured default
    pub version: Option<String>,
    /// Active filter; `None` pages the unfiltered collection
    pub filter: Option<FilterSpec>,
    /// Requested page size; values at or below the default let the engine decide
    pub page_size: i64,
    /// Starting offset; values below 1 start at 0
    pub offset: i64,
}

impl PageQuery {
    /// Create a query for a resource with engine-chosen page size from offset 0
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            version: None,
            filter: None,
            page_size: 0,
            offset: 0,
        }
    }

    /// Set the version
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the filter
    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the starting offset
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// What each page request carries, after encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPayload {
    /// Plain offset/limit GET against the resource
    Unfiltered,
    /// Encoded URL filter for a GET request
    Query(String),
    /// JSON body for a QAPI POST request
    QapiBody(String),
}

impl FilterPayload {
    /// Check whether requests are sent as POST
    pub fn is_post(&self) -> bool {
        matches!(self, Self::QapiBody(_))
    }
}

/// State of one paging operation in progress
///
/// Built per call, mutated by the resolver, then read by the driver.
#[derive(Debug, Clone)]
pub struct PagingContext {
    /// Resource name
    pub resource_name: String,
    /// Version; filled with the default during resolution
    pub version: Option<String>,
    /// Active filter in canonical form
    pub filter: Option<FilterSpec>,
    /// URL-ready filter text, set after resolution
    pub encoded_filter: Option<String>,
    /// Page size; 0 means not yet resolved
    pub page_size: u64,
    /// Total matching records; `None` means unknown
    pub total_count: Option<u64>,
    /// Starting offset as supplied by the caller
    pub offset: i64,
    /// Whether more than one fetch is needed
    pub should_page: bool,
    /// Response of the probe request, if one was made
    pub last_probe_response: Option<ResponseEnvelope>,
}

impl PagingContext {
    /// Create a context from caller-supplied values
    ///
    /// Negative page sizes are stored as 0 (engine decides).
    pub fn new(
        resource_name: impl Into<String>,
        version: Option<String>,
        filter: Option<FilterSpec>,
        page_size: i64,
        offset: i64,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            version,
            filter,
            encoded_filter: None,
            page_size: u64::try_from(page_size).unwrap_or(0),
            total_count: None,
            offset,
            should_page: false,
            last_probe_response: None,
        }
    }

    /// Create a context for a query
    pub fn from_query(query: &PageQuery) -> Self {
        Self::new(
            query.resource_name.clone(),
            query.version.clone(),
            query.filter.clone(),
            query.page_size,
            query.offset,
        )
    }

    /// Version to send, falling back to the unversioned default
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Offset as an unsigned start position
    pub fn start_offset(&self) -> u64 {
        u64::try_from(self.offset).unwrap_or(0)
    }

    /// Payload for page requests
    pub fn payload(&self) -> FilterPayload {
        match &self.filter {
            None => FilterPayload::Unfiltered,
            Some(FilterSpec::QapiBody(body)) => FilterPayload::QapiBody(body.clone()),
            Some(filter) => FilterPayload::Query(
                self.encoded_filter
                    .clone()
                    .unwrap_or_else(|| filter.encoded()),
            ),
        }
    }

    /// Derive `should_page` from the resolved count and page size
    #[must_use]
    pub fn evaluate_should_page(mut self) -> Self {
        self.should_page = should_page(self.total_count, self.page_size);
        self
    }
}

/// Whether a result set needs more than one fetch
///
/// True only when both values are known and the count exceeds the page size.
pub fn should_page(total_count: Option<u64>, page_size: u64) -> bool {
    match total_count {
        Some(total) if page_size > 0 => total > page_size,
        _ => false,
    }
}
