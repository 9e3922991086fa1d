//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (filter + formatter, installed once in main)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Request ID (x-request-id) is attached to every handler log line

pub mod logging;

pub use logging::{build_filter, init_logging};
