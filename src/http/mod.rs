//! HTTP module
//!
//! Provides the transport seam the paging engine fetches through.
//!
//! # Features
//!
//! - **Transport trait**: GET/POST against resource endpoints, returning a `ResponseEnvelope`
//! - **URL building**: `UrlBuilder` trait with a default `EndpointBuilder`
//! - **reqwest client**: `HttpClient` implementation of `Transport`
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod envelope;
mod rate_limit;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use envelope::ResponseEnvelope;
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{version_headers, EndpointBuilder, Transport, UrlBuilder};
