//! Filter module
//!
//! Supports: Criteria, Named Query, Filter Map, QAPI request body
//!
//! # Overview
//!
//! A paging operation uses exactly one filtering mechanism. The first three
//! are carried in the URL of a GET request; QAPI filters are sent as the body
//! of a POST request. `FilterSpec` models the four as a closed sum type and
//! knows how to render each one for URL embedding.

mod encode;
mod types;

pub use encode::{encode_component, encode_criteria_filter_str, encode_named_query_str};
pub use types::{FilterKind, FilterSpec, CRITERIA_PREFIX};
