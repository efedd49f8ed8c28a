// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # Resource Pager
//!
//! Client-side paging over REST resources that return bounded pages of JSON
//! collections.
//!
//! ## Features
//!
//! - **Four filter mechanisms**: criteria, named query, filter map, QAPI POST body
//! - **Single probe**: one request discovers total count and effective page size
//! - **Offset paging**: sequential offset/limit fetches in ascending order
//! - **Pluggable transport**: reqwest client included, any `Transport` works
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resource_pager::{ClientConfig, FilterSpec, PageQuery, PagingEngine, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::from_file("pager.yaml")?;
//!     let engine = PagingEngine::from_config(&config)?;
//!
//!     let filter = FilterSpec::criteria_json(&json!({"lastName": "Smith"}));
//!     let query = PageQuery::new("persons").version("12").filter(filter);
//!
//!     for page in engine.resolve(&query).await? {
//!         println!("{}", page.body);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PagingEngine                          │
//! │   resolve(query) → Vec<ResponseEnvelope>   total_count(..)   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────┬──────────────┬──────────┐
//! │   Filter     │  Resolver           │  Driver      │  HTTP    │
//! ├──────────────┼─────────────────────┼──────────────┼──────────┤
//! │ Criteria     │ Probe request       │ GET offsets  │ Transport│
//! │ Named query  │ Total count header  │ POST offsets │ URLs     │
//! │ Filter map   │ Page size decision  │              │ reqwest  │
//! │ QAPI body    │                     │              │ Rate lim │
//! └──────────────┴─────────────────────┴──────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Paging thresholds and client configuration
pub mod config;

/// Filter mechanisms and encoding
pub mod filter;

/// Transport, URL building and the reqwest client
pub mod http;

/// Paging resolution engine
pub mod pagination;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ClientConfig, PagingConfig};
pub use error::{Error, Result};
pub use filter::{FilterKind, FilterSpec};
pub use http::{EndpointBuilder, HttpClient, ResponseEnvelope, Transport, UrlBuilder};
pub use pagination::{PageQuery, PagingEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
