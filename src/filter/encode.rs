//! Percent-encoding of filter text
//!
//! Filter JSON is percent-encoded as UTF-8 so it can be embedded in a query
//! string. A space becomes `%20`, so plain percent-decoding restores the
//! original text. Keys and the `=` separator are left untouched.

use super::types::CRITERIA_PREFIX;
use url::form_urlencoded;

/// Percent-encode a single query component
pub fn encode_component(value: &str) -> String {
    // byte_serialize escapes a literal `+` as %2B, so any `+` left is a space
    form_urlencoded::byte_serialize(value.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

/// Encode a criteria filter string for URL embedding
///
/// A leading `?criteria=` prefix is stripped, the remaining JSON is encoded,
/// and the prefix is put back unencoded. Input without the prefix is encoded
/// as a whole.
pub fn encode_criteria_filter_str(filter: &str) -> String {
    match filter.strip_prefix(CRITERIA_PREFIX) {
        Some(json) => format!("{CRITERIA_PREFIX}{}", encode_component(json)),
        None => encode_component(filter),
    }
}

/// Encode a named query string for URL embedding
///
/// Only the part after the first `=` is encoded. Input without `=` is
/// encoded as a whole.
pub fn encode_named_query_str(filter: &str) -> String {
    match filter.split_once('=') {
        Some((key, value)) => format!("{key}={}", encode_component(value)),
        None => encode_component(filter),
    }
}
