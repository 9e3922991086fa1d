//! Relay error definitions.

use thiserror::Error;

/// Boxed error carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures funneled into an [`ErrorFunnel`](super::ErrorFunnel).
#[derive(Debug, Error)]
pub enum RelayError {
    /// The target was finalized before the body could be attached.
    #[error("relay target already finalized")]
    TargetFinalized,

    /// A body stream is already being piped into the target.
    #[error("relay target already has a body attached")]
    BodyAlreadyAttached,

    /// No Tokio runtime is available to drive the body stream.
    #[error("no async runtime available to stream the body")]
    NoRuntime,

    /// The upstream body stream failed after headers were committed.
    #[error("upstream body stream failed: {0}")]
    UpstreamBody(#[source] BoxError),

    /// The caller-facing connection went away mid-stream.
    #[error("client disconnected before the body was fully relayed")]
    ClientDisconnected,

    /// The outbound call itself failed (connect, protocol).
    #[error("upstream request failed: {0}")]
    Upstream(#[source] BoxError),
}
