//! Header policy subsystem.
//!
//! # Data Flow
//! ```text
//! process start
//!     → config [headers] blocklist (optional override)
//!     → HeaderBlocklist (normalized, immutable)
//!     → shared via Arc to every relay operation
//!
//! per request:
//!     inbound headers  → relay::project → outbound request
//!     upstream headers → relay::relay   → caller-facing response
//! ```
//!
//! # Design Decisions
//! - One blocklist governs both directions
//! - Matching is case-insensitive; names are stored lowercase
//! - Session and identity headers (cookie, origin, referer, user-agent)
//!   are forwarded even though the fetch standard forbids them

pub mod blocklist;

pub use blocklist::{HeaderBlocklist, DEFAULT_BLOCKLIST};
