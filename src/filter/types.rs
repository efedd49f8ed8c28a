//! Filter types
//!
//! Defines the `FilterSpec` sum type shared by the resolver and the driver.

use super::encode::{encode_criteria_filter_str, encode_named_query_str};
use serde_json::Value;
use std::fmt;

/// Query-string prefix of a criteria filter
pub const CRITERIA_PREFIX: &str = "?criteria=";

/// The filtering mechanism a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// JSON criteria filter (`?criteria={...}`)
    Criteria,
    /// Named query filter (`?<name>={...}`)
    NamedQuery,
    /// Legacy `key=value` filter map
    FilterMap,
    /// QAPI request body sent via POST
    Qapi,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Criteria => "criteria",
            Self::NamedQuery => "named-query",
            Self::FilterMap => "filter-map",
            Self::Qapi => "qapi",
        };
        f.write_str(name)
    }
}

/// A filter for one paging operation
///
/// Each variant holds the canonical, unencoded filter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    /// Criteria filter text, e.g. `?criteria={"lastName":"Smith"}`
    CriteriaFilter(String),
    /// Named query text, e.g. `?keywordSearch={"keywordSearch":"smith"}`
    NamedQueryFilter(String),
    /// Filter map query, e.g. `?lastName=Smith&firstName=John`
    FilterMap(String),
    /// QAPI request body JSON
    QapiBody(String),
}

impl FilterSpec {
    /// Create a criteria filter from a JSON criteria object
    pub fn criteria_json(criteria: &Value) -> Self {
        Self::CriteriaFilter(format!("{CRITERIA_PREFIX}{criteria}"))
    }

    /// Create a named query filter from a query name and its JSON value
    pub fn named_query(name: &str, value: &Value) -> Self {
        Self::NamedQueryFilter(format!("?{name}={value}"))
    }

    /// Create a filter map from `key=value` pairs
    pub fn filter_map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
            .collect::<Vec<_>>()
            .join("&");
        Self::FilterMap(format!("?{query}"))
    }

    /// Create a QAPI filter from a JSON request body
    pub fn qapi(body: &Value) -> Self {
        Self::QapiBody(body.to_string())
    }

    /// Get the filter kind
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::CriteriaFilter(_) => FilterKind::Criteria,
            Self::NamedQueryFilter(_) => FilterKind::NamedQuery,
            Self::FilterMap(_) => FilterKind::FilterMap,
            Self::QapiBody(_) => FilterKind::Qapi,
        }
    }

    /// Get the canonical, unencoded filter text
    pub fn text(&self) -> &str {
        match self {
            Self::CriteriaFilter(s)
            | Self::NamedQueryFilter(s)
            | Self::FilterMap(s)
            | Self::QapiBody(s) => s,
        }
    }

    /// Check whether the filter text is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Check whether this filter is sent as a POST body
    pub fn is_post(&self) -> bool {
        matches!(self, Self::QapiBody(_))
    }

    /// Render the filter for transmission
    ///
    /// Criteria and named-query text is percent-encoded; filter maps and
    /// QAPI bodies are returned unchanged.
    pub fn encoded(&self) -> String {
        match self {
            Self::CriteriaFilter(s) => encode_criteria_filter_str(s),
            Self::NamedQueryFilter(s) => encode_named_query_str(s),
            Self::FilterMap(s) | Self::QapiBody(s) => s.clone(),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
