//! Upstream redirect following.
//!
//! # Responsibilities
//! - Re-issue the outbound request when the upstream answers with a redirect
//! - Resolve `Location` against the URI that produced it
//! - Bound the number of hops
//!
//! # Design Decisions
//! - 303, and 301/302 after a POST, continue as a bodiless GET
//! - A streamed request body cannot be replayed: a redirect that needs it
//!   again fails instead of sending an empty body
//! - Credentials and the host header do not cross to another origin

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode, Uri};
use hyper::body::{Body as _, Incoming};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use thiserror::Error;
use url::Url;

/// Hop limit used when nothing else is configured.
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Headers describing a request body, dropped when the body is.
const BODY_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
];

/// Reasons a redirect chain could not be completed.
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("upstream request failed: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("more than {0} redirects")]
    TooMany(usize),

    #[error("cannot replay a streamed request body for a {0} redirect")]
    BodyNotReplayable(StatusCode),

    #[error("invalid redirect location '{0}'")]
    InvalidLocation(String),

    #[error("unsupported redirect scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Whether and how far redirects are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub follow: bool,
    pub max_hops: usize,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            follow: true,
            max_hops: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Send `request`, following upstream redirects according to `policy`.
///
/// The returned response is never a followable redirect unless the policy
/// disables following.
pub async fn send_following_redirects(
    client: &Client<HttpConnector, Body>,
    request: Request<Body>,
    policy: RedirectPolicy,
) -> Result<Response<Incoming>, RedirectError> {
    let (parts, body) = request.into_parts();
    let mut method = parts.method;
    let mut uri = parts.uri;
    let mut headers = parts.headers;

    // Only an empty body can be sent again on a later hop.
    let mut body_replayable = body.is_end_stream();
    let mut body = Some(body);
    let mut hops = 0;

    loop {
        let mut request = Request::new(body.take().unwrap_or_else(Body::empty));
        *request.method_mut() = method.clone();
        *request.uri_mut() = uri.clone();
        *request.headers_mut() = headers.clone();

        let response = client.request(request).await?;
        let status = response.status();
        if !policy.follow || !is_redirect(status) {
            return Ok(response);
        }
        let Some(location) = response.headers().get(header::LOCATION) else {
            // Nothing to follow; the caller sees the redirect as-is.
            return Ok(response);
        };

        let next = resolve_location(&uri, location.as_bytes())?;
        if hops == policy.max_hops {
            return Err(RedirectError::TooMany(policy.max_hops));
        }
        hops += 1;

        let next_method = redirect_method(status, &method);
        if next_method != method {
            for name in BODY_HEADERS {
                headers.remove(name);
            }
            body_replayable = true;
        } else if !body_replayable {
            return Err(RedirectError::BodyNotReplayable(status));
        }

        if !same_origin(&uri, &next) {
            headers.remove(header::AUTHORIZATION);
            headers.remove(header::HOST);
        }

        tracing::debug!(
            status = status.as_u16(),
            from = %uri,
            to = %next,
            hop = hops,
            "Following upstream redirect"
        );
        method = next_method;
        uri = next;
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Method for the next hop.
fn redirect_method(status: StatusCode, method: &Method) -> Method {
    match status {
        StatusCode::SEE_OTHER if method != Method::GET && method != Method::HEAD => Method::GET,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if method == Method::POST => Method::GET,
        _ => method.clone(),
    }
}

/// Resolve a `Location` value against the URI that returned it.
fn resolve_location(current: &Uri, location: &[u8]) -> Result<Uri, RedirectError> {
    let location = std::str::from_utf8(location)
        .map_err(|_| RedirectError::InvalidLocation(String::from_utf8_lossy(location).into_owned()))?;
    let invalid = || RedirectError::InvalidLocation(location.to_string());

    let base = Url::parse(&current.to_string()).map_err(|_| invalid())?;
    let mut next = base.join(location).map_err(|_| invalid())?;
    if next.scheme() != "http" {
        return Err(RedirectError::UnsupportedScheme(next.scheme().to_string()));
    }
    next.set_fragment(None);
    next.as_str().parse().map_err(|_| invalid())
}

fn same_origin(a: &Uri, b: &Uri) -> bool {
    a.scheme() == b.scheme() && a.authority() == b.authority()
}
