//! Tests for pagination module

use super::*;
use super::driver::page_offset;
use crate::config::PagingConfig;
use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::http::{EndpointBuilder, ResponseEnvelope, Transport, UrlBuilder};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::json;
use std::sync::{Arc, Mutex};
use test_case::test_case;
use url::Url;

const BASE: &str = "https://api.test";

// ============================================================================
// Fake server
// ============================================================================

#[derive(Debug, Clone)]
struct Call {
    method: &'static str,
    url: String,
    body: Option<String>,
}

impl Call {
    fn param(&self, name: &str) -> Option<String> {
        Url::parse(&self.url)
            .ok()?
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn offset(&self) -> Option<u64> {
        self.param("offset").and_then(|v| v.parse().ok())
    }
}

/// In-memory collection of `total` records served `max_page` at a time
struct FakeServer {
    total: u64,
    max_page: u64,
    send_total_header: bool,
    fail_at_offset: Option<u64>,
    calls: Mutex<Vec<Call>>,
}

impl FakeServer {
    fn new(total: u64, max_page: u64) -> Self {
        Self {
            total,
            max_page,
            send_total_header: true,
            fail_at_offset: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn without_total_header(mut self) -> Self {
        self.send_total_header = false;
        self
    }

    fn failing_at(mut self, offset: u64) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: Call) -> Result<ResponseEnvelope> {
        let offset = call.offset().unwrap_or(0);
        let limit = call
            .param("limit")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.max_page)
            .min(self.max_page);
        self.calls.lock().unwrap().push(call);

        if self.fail_at_offset == Some(offset) {
            return Err(Error::http_status(503, "unavailable"));
        }

        let count = self.total.saturating_sub(offset).min(limit);
        let records: Vec<_> = (offset..offset + count).map(|id| json!({ "id": id })).collect();
        let mut envelope = ResponseEnvelope::new(200, json!(records).to_string())
            .with_header("x-max-page-size", self.max_page.to_string());
        if self.send_total_header {
            envelope = envelope.with_header("x-total-count", self.total.to_string());
        }
        Ok(envelope)
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> Result<ResponseEnvelope> {
        self.respond(Call {
            method: "GET",
            url: url.to_string(),
            body: None,
        })
    }

    async fn post(&self, url: &str, _headers: &HeaderMap, body: &str) -> Result<ResponseEnvelope> {
        self.respond(Call {
            method: "POST",
            url: url.to_string(),
            body: Some(body.to_string()),
        })
    }
}

struct FixedCountProbe(u64);

#[async_trait]
impl TotalCountProbe for FixedCountProbe {
    async fn total_count(&self, _resource: &str, _version: &str) -> Result<u64> {
        Ok(self.0)
    }
}

fn urls() -> EndpointBuilder {
    EndpointBuilder::new(BASE).unwrap()
}

fn engine_for(server: &Arc<FakeServer>) -> PagingEngine {
    let transport: Arc<dyn Transport> = server.clone();
    PagingEngine::new(transport, Arc::new(urls()))
}

fn criteria() -> FilterSpec {
    FilterSpec::criteria_json(&json!({"lastName": "Smith"}))
}

// ============================================================================
// Page count / should_page
// ============================================================================

#[test_case(25, 10, 0 => 3; "partial last page")]
#[test_case(30, 10, 0 => 3; "exact multiple")]
#[test_case(10, 10, 0 => 1; "single full page")]
#[test_case(25, 10, 5 => 2; "start offset")]
#[test_case(26, 5, 1 => 5; "start offset exact")]
#[test_case(0, 10, 0 => 0; "empty collection")]
#[test_case(5, 10, 8 => 0; "offset past end")]
#[test_case(5, 0, 0 => 0; "zero page size")]
fn test_page_count(total: u64, page_size: u64, start: u64) -> u64 {
    page_count(total, page_size, start)
}

#[test]
fn test_should_page() {
    assert!(should_page(Some(25), 10));
    assert!(!should_page(Some(10), 10));
    assert!(!should_page(Some(3), 10));
    assert!(!should_page(None, 10));
    assert!(!should_page(Some(25), 0));
    assert!(!should_page(None, 0));
}

// ============================================================================
// PagingContext
// ============================================================================

#[test]
fn test_context_from_query() {
    let query = PageQuery::new("persons")
        .version("12")
        .filter(criteria())
        .page_size(-5)
        .offset(-3);
    let context = PagingContext::from_query(&query);

    assert_eq!(context.resource_name, "persons");
    assert_eq!(context.version(), "12");
    assert_eq!(context.page_size, 0);
    assert_eq!(context.total_count, None);
    assert_eq!(context.start_offset(), 0);
    assert!(!context.should_page);
}

#[test]
fn test_context_payload() {
    let context = PagingContext::new("persons", None, None, 0, 0);
    assert_eq!(context.payload(), FilterPayload::Unfiltered);

    let qapi = FilterSpec::qapi(&json!({"a": 1}));
    let context = PagingContext::new("persons", None, Some(qapi), 0, 0);
    assert_eq!(
        context.payload(),
        FilterPayload::QapiBody(r#"{"a":1}"#.to_string())
    );
    assert!(context.payload().is_post());

    let context = PagingContext::new("persons", None, Some(criteria()), 0, 0);
    assert_eq!(
        context.payload(),
        FilterPayload::Query(criteria().encoded())
    );
}

#[test]
fn test_context_evaluate_should_page() {
    let mut context = PagingContext::new("persons", None, None, 0, 0);
    assert!(!context.clone().evaluate_should_page().should_page);

    context.total_count = Some(11);
    context.page_size = 10;
    assert!(context.evaluate_should_page().should_page);
}

// ============================================================================
// resolve_page_size
// ============================================================================

#[test]
fn test_resolve_page_size_caller_override() {
    let probe = ResponseEnvelope::new(200, "[1,2,3]");
    assert_eq!(
        resolve_page_size(50, 0, Some(&probe), "x-max-page-size", 500),
        50
    );
}

#[test]
fn test_resolve_page_size_without_probe() {
    assert_eq!(resolve_page_size(0, 0, None, "x-max-page-size", 500), 500);
}

#[test]
fn test_resolve_page_size_from_body() {
    let probe = ResponseEnvelope::new(200, "[1,2,3]").with_header("x-max-page-size", "100");
    assert_eq!(
        resolve_page_size(0, 0, Some(&probe), "x-max-page-size", 500),
        3
    );
}

#[test]
fn test_resolve_page_size_from_header() {
    let probe = ResponseEnvelope::new(200, "  ").with_header("x-max-page-size", "100");
    assert_eq!(
        resolve_page_size(0, 0, Some(&probe), "x-max-page-size", 500),
        100
    );
}

#[test]
fn test_resolve_page_size_non_array_body_uses_header() {
    let probe = ResponseEnvelope::new(200, r#"{"id":1}"#).with_header("x-max-page-size", "25");
    assert_eq!(
        resolve_page_size(0, 0, Some(&probe), "x-max-page-size", 500),
        25
    );
}

#[test]
fn test_resolve_page_size_bad_header_uses_max() {
    let probe = ResponseEnvelope::new(200, "").with_header("x-max-page-size", "many");
    assert_eq!(
        resolve_page_size(0, 0, Some(&probe), "x-max-page-size", 500),
        500
    );
}

#[test]
fn test_resolve_page_size_threshold() {
    let probe = ResponseEnvelope::new(200, "[1,2]");
    // At the threshold the engine still decides
    assert_eq!(
        resolve_page_size(10, 10, Some(&probe), "x-max-page-size", 500),
        2
    );
    assert_eq!(
        resolve_page_size(11, 10, Some(&probe), "x-max-page-size", 500),
        11
    );
}

// ============================================================================
// CountAndSizeResolver
// ============================================================================

#[tokio::test]
async fn test_populate_with_criteria() {
    let server = FakeServer::new(25, 10);
    let urls = urls();
    let config = PagingConfig::default();
    let fallback = FixedCountProbe(0);
    let resolver = CountAndSizeResolver::new(&server, &urls, &fallback, &config);

    let context = PagingContext::new("persons", None, Some(criteria()), 0, -4);
    let context = resolver.populate(context).await.unwrap();

    assert_eq!(context.version.as_deref(), Some(""));
    assert_eq!(context.offset, 0);
    assert_eq!(context.total_count, Some(25));
    assert_eq!(context.page_size, 10);
    assert_eq!(context.encoded_filter, Some(criteria().encoded()));
    assert!(context.last_probe_response.is_some());

    let calls = server.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].url, urls.filter_url("persons", &criteria().encoded()));
    assert_eq!(
        calls[0].param("criteria").as_deref(),
        Some(r#"{"lastName":"Smith"}"#)
    );
}

#[tokio::test]
async fn test_populate_respects_caller_page_size() {
    let server = FakeServer::new(25, 10);
    let urls = urls();
    let config = PagingConfig::default();
    let fallback = FixedCountProbe(0);
    let resolver = CountAndSizeResolver::new(&server, &urls, &fallback, &config);

    let context = PagingContext::new("persons", Some("12".into()), Some(criteria()), 7, 3);
    let context = resolver.populate(context).await.unwrap();

    assert_eq!(context.version(), "12");
    assert_eq!(context.offset, 3);
    assert_eq!(context.page_size, 7);
}

#[tokio::test]
async fn test_populate_missing_total_header() {
    let server = FakeServer::new(25, 10).without_total_header();
    let urls = urls();
    let config = PagingConfig::default();
    let fallback = FixedCountProbe(0);
    let resolver = CountAndSizeResolver::new(&server, &urls, &fallback, &config);

    let context = PagingContext::new("persons", None, Some(criteria()), 0, 0);
    let err = resolver.populate(context).await.unwrap_err();

    match err {
        Error::MissingHeader { header } => assert_eq!(header, "x-total-count"),
        other => panic!("Expected MissingHeader, got {other:?}"),
    }
}

#[tokio::test]
async fn test_populate_without_filter_uses_fallback() {
    let server = FakeServer::new(25, 10);
    let urls = urls();
    let config = PagingConfig::default().with_max_page_size(20);
    let fallback = FixedCountProbe(42);
    let resolver = CountAndSizeResolver::new(&server, &urls, &fallback, &config);

    let context = PagingContext::new("persons", None, None, 0, 0);
    let context = resolver.populate(context).await.unwrap();

    assert_eq!(context.total_count, Some(42));
    assert_eq!(context.page_size, 20);
    assert!(context.last_probe_response.is_none());
    assert!(context.encoded_filter.is_none());
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_populate_qapi_probe_is_post() {
    let server = FakeServer::new(5, 10);
    let urls = urls();
    let config = PagingConfig::default();
    let fallback = FixedCountProbe(0);
    let resolver = CountAndSizeResolver::new(&server, &urls, &fallback, &config);

    let qapi = FilterSpec::qapi(&json!({"lastName": "Smith"}));
    let context = PagingContext::new("persons", None, Some(qapi), 0, 0);
    let context = resolver.populate(context).await.unwrap();

    assert_eq!(context.total_count, Some(5));
    assert_eq!(context.page_size, 5);
    assert!(context.encoded_filter.is_none());

    let calls = server.calls();
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].url, urls.qapi_url("persons"));
    assert_eq!(calls[0].body.as_deref(), Some(r#"{"lastName":"Smith"}"#));
}

// ============================================================================
// PagingDriver
// ============================================================================

#[tokio::test]
async fn test_drain_offsets_ascending() {
    let server = FakeServer::new(25, 10);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let payload = FilterPayload::Query(criteria().encoded());
    let pages = driver
        .drain_from("persons", "", &payload, 25, 10, 0)
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    let offsets: Vec<_> = server.calls().iter().filter_map(Call::offset).collect();
    assert_eq!(offsets, vec![0, 10, 20]);
    let sizes: Vec<_> = pages.iter().filter_map(ResponseEnvelope::record_count).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[tokio::test]
async fn test_drain_from_start_offset() {
    let server = FakeServer::new(26, 5);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let pages = driver
        .drain_from("persons", "", &FilterPayload::Unfiltered, 26, 5, 1)
        .await
        .unwrap();

    assert_eq!(pages.len(), 5);
    let offsets: Vec<_> = server.calls().iter().filter_map(Call::offset).collect();
    assert_eq!(offsets, vec![1, 6, 11, 16, 21]);
    assert!(server.calls()[0].url.starts_with(&urls.resource_url("persons")));
}

#[tokio::test]
async fn test_drain_zero_page_size() {
    let server = FakeServer::new(25, 10);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let err = driver
        .drain_from("persons", "", &FilterPayload::Unfiltered, 25, 0, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPageSize { page_size: 0 }));
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_drain_qapi_posts_each_page() {
    let server = FakeServer::new(12, 5);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let payload = FilterPayload::QapiBody(r#"{"a":1}"#.to_string());
    let pages = driver
        .drain_from("persons", "", &payload, 12, 5, 0)
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    let calls = server.calls();
    assert!(calls.iter().all(|c| c.method == "POST"));
    assert!(calls.iter().all(|c| c.body.as_deref() == Some(r#"{"a":1}"#)));
    assert_eq!(calls[2].url, urls.qapi_page_url("persons", 10, 5));
}

#[tokio::test]
async fn test_drain_failure_aborts() {
    let server = FakeServer::new(40, 10).failing_at(10);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let err = driver
        .drain_from("persons", "", &FilterPayload::Unfiltered, 40, 10, 0)
        .await
        .unwrap_err();

    assert!(err.is_transport());
    // Nothing is fetched after the failing page
    assert_eq!(server.calls().len(), 2);
}

#[tokio::test]
async fn test_drain_huge_total_count_fails_without_panicking() {
    let server = FakeServer::new(0, 10).failing_at(0);
    let urls = urls();
    let config = PagingConfig::default();
    let driver = PagingDriver::new(&server, &urls, &config);

    let payload = FilterPayload::Query(criteria().encoded());
    let err = driver
        .drain_from("persons", "", &payload, 1 << 62, 1, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert_eq!(server.calls().len(), 1);
}

#[test]
fn test_page_offset_overflow_is_error() {
    assert_eq!(page_offset(5, 3, 10).unwrap(), 35);
    assert_eq!(page_offset(u64::MAX, 0, 10).unwrap(), u64::MAX);

    let err = page_offset(0, u64::MAX, 2).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    let err = page_offset(u64::MAX, 1, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

// ============================================================================
// PagingEngine
// ============================================================================

#[tokio::test]
async fn test_engine_blank_resource_makes_no_requests() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    let err = engine
        .resolve(&PageQuery::new("  ").filter(criteria()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_engine_blank_filter_makes_no_requests() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    let query = PageQuery::new("persons").filter(FilterSpec::CriteriaFilter(String::new()));
    let err = engine.resolve(&query).await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_engine_single_page_is_one_fetch() {
    let server = Arc::new(FakeServer::new(10, 10));
    let engine = engine_for(&server);

    let pages = engine
        .resolve(&PageQuery::new("persons").filter(criteria()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].record_count(), Some(10));
    assert_eq!(server.calls().len(), 1);
}

#[tokio::test]
async fn test_engine_multi_page() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    let pages = engine
        .resolve(&PageQuery::new("persons").filter(criteria()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    let calls = server.calls();
    // probe, then one request per page
    assert_eq!(calls.len(), 4);
    let offsets: Vec<_> = calls[1..].iter().filter_map(Call::offset).collect();
    assert_eq!(offsets, vec![0, 10, 20]);
    assert!(calls[1..]
        .iter()
        .all(|c| c.param("criteria").as_deref() == Some(r#"{"lastName":"Smith"}"#)));
}

#[tokio::test]
async fn test_engine_caller_page_size() {
    let server = Arc::new(FakeServer::new(12, 10));
    let engine = engine_for(&server);

    let query = PageQuery::new("persons").filter(criteria()).page_size(5);
    let pages = engine.resolve(&query).await.unwrap();

    assert_eq!(pages.len(), 3);
    let calls = server.calls();
    let limits: Vec<_> = calls[1..].iter().filter_map(|c| c.param("limit")).collect();
    assert_eq!(limits, vec!["5", "5", "5"]);
}

#[tokio::test]
async fn test_engine_single_page_from_offset() {
    let server = Arc::new(FakeServer::new(8, 10));
    let engine = engine_for(&server);

    let query = PageQuery::new("persons").filter(criteria()).offset(3);
    let pages = engine.resolve(&query).await.unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].record_count(), Some(5));
    let calls = server.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].offset(), Some(3));
}

#[tokio::test]
async fn test_engine_multi_page_from_offset() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    let query = PageQuery::new("persons").filter(criteria()).offset(10);
    let pages = engine.resolve(&query).await.unwrap();

    assert_eq!(pages.len(), 2);
    let offsets: Vec<_> = server.calls()[1..].iter().filter_map(Call::offset).collect();
    assert_eq!(offsets, vec![10, 20]);
}

#[tokio::test]
async fn test_engine_filter_map() {
    let server = Arc::new(FakeServer::new(15, 10));
    let engine = engine_for(&server);

    let filter = FilterSpec::filter_map([("lastName", "Smith")]);
    let pages = engine
        .resolve(&PageQuery::new("persons").filter(filter))
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    let calls = server.calls();
    assert_eq!(calls[1].url, urls().filter_page_url("persons", "?lastName=Smith", 0, 10));
    assert_eq!(calls[2].url, urls().filter_page_url("persons", "?lastName=Smith", 10, 10));
}

#[tokio::test]
async fn test_engine_qapi() {
    let server = Arc::new(FakeServer::new(15, 10));
    let engine = engine_for(&server);

    let filter = FilterSpec::qapi(&json!({"lastName": "Smith"}));
    let pages = engine
        .resolve(&PageQuery::new("persons").filter(filter))
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    let calls = server.calls();
    assert!(calls.iter().all(|c| c.method == "POST"));
    assert_eq!(calls[0].url, urls().qapi_url("persons"));
    assert_eq!(calls[2].url, urls().qapi_page_url("persons", 10, 10));
}

#[tokio::test]
async fn test_engine_unfiltered_uses_default_count_probe() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server)
        .with_config(PagingConfig::default().with_max_page_size(10));

    let pages = engine.resolve(&PageQuery::new("persons")).await.unwrap();

    assert_eq!(pages.len(), 3);
    let calls = server.calls();
    assert_eq!(calls[0].url, urls().resource_url("persons"));
    assert_eq!(calls[1].url, urls().resource_page_url("persons", 0, 10));
}

#[tokio::test]
async fn test_engine_unfiltered_with_custom_probe() {
    let server = Arc::new(FakeServer::new(3, 10));
    let engine = engine_for(&server).with_fallback_probe(Arc::new(FixedCountProbe(3)));

    let pages = engine.resolve(&PageQuery::new("persons")).await.unwrap();

    // No probe envelope, so the single page is fetched directly
    assert_eq!(pages.len(), 1);
    let calls = server.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, urls().resource_page_url("persons", 0, 500));
}

#[tokio::test]
async fn test_engine_transport_failure_returns_no_pages() {
    let server = Arc::new(FakeServer::new(30, 10).failing_at(20));
    let engine = engine_for(&server);

    let result = engine
        .resolve(&PageQuery::new("persons").filter(criteria()))
        .await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn test_engine_total_count() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    assert_eq!(engine.total_count(None, None, Some(&criteria())).await.unwrap(), 0);
    assert_eq!(engine.total_count(Some("persons"), None, None).await.unwrap(), 0);
    assert!(server.calls().is_empty());

    let total = engine
        .total_count(Some("persons"), Some("12"), Some(&criteria()))
        .await
        .unwrap();
    assert_eq!(total, 25);
    assert_eq!(server.calls().len(), 1);
}

#[tokio::test]
async fn test_engine_total_count_missing_header() {
    let server = Arc::new(FakeServer::new(25, 10).without_total_header());
    let engine = engine_for(&server);

    let err = engine
        .total_count(Some("persons"), None, Some(&criteria()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingHeader { .. }));
}

#[tokio::test]
async fn test_engine_resource_total_count() {
    let server = Arc::new(FakeServer::new(42, 10));
    let engine = engine_for(&server);

    let total = engine.resource_total_count("persons", None).await.unwrap();

    assert_eq!(total, 42);
    let calls = server.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, urls().resource_url("persons"));

    let err = engine.resource_total_count("  ", None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(server.calls().len(), 1);
}

#[tokio::test]
async fn test_engine_total_count_blank_resource_is_error() {
    let server = Arc::new(FakeServer::new(25, 10));
    let engine = engine_for(&server);

    let err = engine
        .total_count(Some("  "), None, Some(&criteria()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(server.calls().is_empty());
}
