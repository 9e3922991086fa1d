//! Inbound header projection.
//!
//! # Responsibilities
//! - Read the caller's request headers as `(name, HeaderField)` pairs
//! - Append every non-blocked value onto an [`OutboundHeaderSet`]
//! - Absorb values that cannot be represented as HTTP headers
//!
//! # Design Decisions
//! - Repeated headers stay repeated (one append per value)
//! - A blocked header only removes itself, never the request
//! - No deduplication across calls

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Request};

use crate::policy::HeaderBlocklist;

/// A single inbound header's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Absent,
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for HeaderField {
    fn from(value: &str) -> Self {
        HeaderField::Single(value.to_string())
    }
}

impl From<String> for HeaderField {
    fn from(value: String) -> Self {
        HeaderField::Single(value)
    }
}

impl From<Vec<String>> for HeaderField {
    fn from(values: Vec<String>) -> Self {
        HeaderField::Multiple(values)
    }
}

impl<T: Into<HeaderField>> From<Option<T>> for HeaderField {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HeaderField::Absent)
    }
}

/// Anything that exposes the caller's request headers.
pub trait InboundRequest {
    /// Header pairs in the request's natural iteration order.
    fn header_fields(&self) -> Vec<(String, HeaderField)>;
}

impl InboundRequest for HeaderMap {
    fn header_fields(&self) -> Vec<(String, HeaderField)> {
        self.keys()
            .map(|name| {
                let mut values: Vec<String> = self
                    .get_all(name)
                    .iter()
                    .filter_map(|v| match v.to_str() {
                        Ok(s) => Some(s.to_string()),
                        Err(_) => {
                            tracing::debug!(header = %name, "Dropping non-text header value");
                            None
                        }
                    })
                    .collect();

                let field = match values.len() {
                    0 => HeaderField::Absent,
                    1 => HeaderField::Single(values.remove(0)),
                    _ => HeaderField::Multiple(values),
                };
                (name.as_str().to_string(), field)
            })
            .collect()
    }
}

impl InboundRequest for Parts {
    fn header_fields(&self) -> Vec<(String, HeaderField)> {
        self.headers.header_fields()
    }
}

impl<B> InboundRequest for Request<B> {
    fn header_fields(&self) -> Vec<(String, HeaderField)> {
        self.headers().header_fields()
    }
}

impl<K: AsRef<str>> InboundRequest for [(K, HeaderField)] {
    fn header_fields(&self) -> Vec<(String, HeaderField)> {
        self.iter()
            .map(|(name, field)| (name.as_ref().to_string(), field.clone()))
            .collect()
    }
}

impl<K: AsRef<str>> InboundRequest for Vec<(K, HeaderField)> {
    fn header_fields(&self) -> Vec<(String, HeaderField)> {
        self.as_slice().header_fields()
    }
}

/// Headers for the outbound request. Append-only multi-map.
#[derive(Debug, Clone, Default)]
pub struct OutboundHeaderSet {
    headers: HeaderMap,
}

impl OutboundHeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `name`, keeping earlier values.
    ///
    /// Returns false when either side is not a valid HTTP header token.
    pub fn append(&mut self, name: &str, value: &str) -> bool {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::debug!(header = %name, "Dropping invalid header name");
            return false;
        };
        let Ok(header_value) = HeaderValue::from_str(value) else {
            tracing::debug!(header = %name, "Dropping invalid header value");
            return false;
        };
        self.headers.append(header_name, header_value);
        true
    }

    /// All values recorded for `name`, in append order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Total number of values (not names).
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.headers
    }
}

/// Copy the request's headers into `outbound`, skipping blocked names.
pub fn project<R>(request: &R, outbound: &mut OutboundHeaderSet, blocklist: &HeaderBlocklist)
where
    R: InboundRequest + ?Sized,
{
    for (name, field) in request.header_fields() {
        if blocklist.contains(&name) {
            continue;
        }
        match field {
            HeaderField::Multiple(values) => {
                for value in &values {
                    outbound.append(&name, value);
                }
            }
            HeaderField::Single(value) => {
                outbound.append(&name, &value);
            }
            HeaderField::Absent => {}
        }
    }
}
