//! Outbound request construction.
//!
//! # Responsibilities
//! - Resolve the upstream URI (base URL + inbound path and query)
//! - Build the outbound request from projected headers and the inbound body
//!
//! # Design Decisions
//! - Inbound body is streamed through, never buffered
//! - Host and framing headers are left to the client (they are blocklisted)

use axum::body::Body;
use axum::http::{request::Parts, uri::InvalidUri, Request, Uri};
use url::Url;

use crate::relay::OutboundHeaderSet;

/// Append the inbound path and query to `base`.
pub fn upstream_uri(base: &Url, inbound: &Uri) -> Result<Uri, InvalidUri> {
    let base = base.as_str().trim_end_matches('/');
    let path_and_query = inbound
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{}{}", base, path_and_query).parse()
}

/// Assemble the request sent upstream.
pub fn build_upstream_request(
    parts: &Parts,
    uri: Uri,
    headers: OutboundHeaderSet,
    body: Body,
) -> Request<Body> {
    let mut request = Request::new(body);
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = uri;
    *request.headers_mut() = headers.into_header_map();
    request
}
