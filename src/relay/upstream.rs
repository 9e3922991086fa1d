//! Upstream response adapter.
//!
//! Wraps whatever the outbound client returned into the shape the relay
//! consumes: status, status text, headers and an optional body stream.

use std::pin::Pin;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use futures_util::{Stream, TryStreamExt};
use hyper::body::{Body as _, Incoming};

use crate::relay::error::BoxError;

/// Streamed response body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Completed outbound response, body not yet consumed.
pub struct UpstreamResponse {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    body: Option<BodyStream>,
}

impl UpstreamResponse {
    /// A bodiless response with the canonical status text.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adapt a response from the hyper client, streaming its body.
    pub fn from_hyper(response: Response<Incoming>) -> Self {
        let (parts, incoming) = response.into_parts();

        let status_text = match parts.extensions.get::<hyper::ext::ReasonPhrase>() {
            Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
            None => parts.status.canonical_reason().unwrap_or_default().to_string(),
        };

        let body = if incoming.is_end_stream() || !status_allows_body(parts.status) {
            None
        } else {
            let stream = Body::new(incoming).into_data_stream().map_err(BoxError::from);
            Some(Box::pin(stream) as BodyStream)
        };

        Self {
            status: parts.status,
            status_text,
            headers: parts.headers,
            body,
        }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Append a header, keeping earlier values of the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body<S, E>(mut self, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.body = Some(Box::pin(stream.map_err(Into::<BoxError>::into)));
        self
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Take the body stream, leaving the response bodiless.
    pub fn take_body(&mut self) -> Option<BodyStream> {
        self.body.take()
    }
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

fn status_allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}
