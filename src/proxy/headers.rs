//! Header utilities for upstream calls
//!
//! The relay never forwards caller headers upstream; every outbound request
//! carries the same minimal header set. The credential travels in the URL,
//! not in a header.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};

/// User agent announced to the upstream
const RELAY_USER_AGENT: &str = concat!("genrelay/", env!("CARGO_PKG_VERSION"));

/// Build the headers sent with every upstream request
pub fn build_upstream_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(RELAY_USER_AGENT));

    headers
}
