//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (upstream URI, outbound request with projected headers)
//!     → redirect.rs (hyper-util client call, upstream redirects followed)
//!     → relay (status + headers + streamed body back to the caller)
//! ```

pub mod redirect;
pub mod request;
pub mod server;

pub use server::{HttpServer, ServerError};
