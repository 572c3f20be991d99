//! Header utilities for relayed responses
//!
//! Streamed responses carry the upstream status and content type; every
//! other header is derived locally rather than copied from the upstream.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Content type assumed when the upstream does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Content type declared by the upstream, or the JSON default
pub fn upstream_content_type(upstream: &HeaderMap) -> HeaderValue {
    upstream
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE))
}

/// Headers attached to a streamed response
pub fn stream_response_headers(content_type: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    // Keeps reverse proxies such as nginx from buffering the stream.
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    headers
}
