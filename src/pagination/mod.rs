//! Pagination module
//!
//! Offset paging over filtered resource collections.
//!
//! # Overview
//!
//! A paging operation runs as a small pipeline:
//!
//! ```text
//! PageQuery -> PagingContext
//!           -> CountAndSizeResolver::populate   (one probe request)
//!           -> PagingContext::evaluate_should_page
//!           -> single page | PagingDriver::drain_from (one request per page)
//! ```
//!
//! `PagingEngine` wires these together behind `resolve`, `total_count` and
//! `resource_total_count`.

mod driver;
mod engine;
mod resolver;
mod types;

pub use driver::{page_count, PagingDriver};
pub use engine::PagingEngine;
pub use resolver::{
    read_total_count, resolve_page_size, CountAndSizeResolver, HeaderCountProbe, TotalCountProbe,
};
pub use types::{should_page, FilterPayload, PageQuery, PagingContext};

#[cfg(test)]
mod tests;
