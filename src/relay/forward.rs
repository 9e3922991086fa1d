//! Upstream response relay.
//!
//! # Responsibilities
//! - Turn a not-ok upstream response into a bodiless reply with its status
//! - Copy status and non-blocked headers onto the relay target
//! - Hand the body off to the target and return without waiting
//!
//! # Design Decisions
//! - Nothing escapes `relay`: every failure goes to the error funnel
//! - The first value of a header replaces, later values append

use std::sync::Arc;

use crate::policy::HeaderBlocklist;
use crate::relay::error_handler::ErrorFunnel;
use crate::relay::target::RelayTarget;
use crate::relay::upstream::UpstreamResponse;

/// Drive `target` from a completed upstream response.
pub fn relay<T: RelayTarget>(
    mut upstream: UpstreamResponse,
    target: &T,
    blocklist: &HeaderBlocklist,
    on_error: Arc<dyn ErrorFunnel>,
) {
    if !upstream.ok() {
        tracing::error!(
            status = upstream.status().as_u16(),
            "Request failed: {}",
            upstream.status_text()
        );
        target.set_status(upstream.status());
        target.finalize();
        return;
    }

    target.set_status(upstream.status());

    let headers = upstream.headers();
    for name in headers.keys() {
        if blocklist.contains(name.as_str()) {
            continue;
        }
        let mut values = headers.get_all(name).iter();
        if let Some(first) = values.next() {
            target.set_header(name, first);
        }
        for value in values {
            target.append_header(name, value);
        }
    }

    match upstream.take_body() {
        Some(body) => {
            if let Err(e) = target.pipe(body, on_error.clone()) {
                on_error.handle(&e);
            }
        }
        None => {
            target.finalize();
        }
    }
}
