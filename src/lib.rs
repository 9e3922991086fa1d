//! Header-filtering HTTP relay library.
//!
//! Forwards an inbound request to an upstream and streams the upstream
//! response back, stripping blocklisted headers on both legs.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use policy::HeaderBlocklist;
pub use relay::{project, relay, ErrorHandler, OutboundHeaderSet, ResponseTarget, UpstreamResponse};
