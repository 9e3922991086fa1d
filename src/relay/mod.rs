//! Header projection and response relay.
//!
//! # Data Flow
//! ```text
//! caller request
//!     → project.rs (inbound headers → OutboundHeaderSet, blocklist applied)
//!     → [HTTP client issues the outbound call]
//!     → upstream.rs (UpstreamResponse: status, headers, body stream)
//!     → forward.rs (status + headers onto the target, body handed off)
//!     → target.rs (body drained on a Tokio task, finalized once)
//!
//! On failure after hand-off:
//!     → error_handler.rs (log, fallback status, finalize)
//! ```
//!
//! # Design Decisions
//! - Header work is synchronous; only the body transfer is async
//! - `relay` never returns an error, it funnels them
//! - Finalize is idempotent at the target

pub mod error;
pub mod error_handler;
pub mod forward;
pub mod project;
pub mod target;
pub mod upstream;

pub use error::{BoxError, RelayError};
pub use error_handler::{ErrorFunnel, ErrorHandler, DEFAULT_STREAMING_MESSAGE};
pub use forward::relay;
pub use project::{project, HeaderField, InboundRequest, OutboundHeaderSet};
pub use target::{RelayTarget, ResponseTarget};
pub use upstream::{BodyStream, UpstreamResponse};
