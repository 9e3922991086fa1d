//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::redirect::{RedirectPolicy, DEFAULT_MAX_REDIRECTS};
use crate::policy::HeaderBlocklist;
use crate::relay::DEFAULT_STREAMING_MESSAGE;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Header policy.
    pub headers: HeadersConfig,

    /// Fallback statuses and log messages for relay failures.
    pub errors: ErrorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; the inbound path and query are appended to it.
    pub base_url: String,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Follow upstream redirects instead of relaying them.
    pub follow_redirects: bool,

    /// Redirect hops allowed before the call fails.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl UpstreamConfig {
    pub fn redirect_policy(&self) -> RedirectPolicy {
        RedirectPolicy {
            follow: self.follow_redirects,
            max_hops: self.max_redirects,
        }
    }
}

/// Header policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeadersConfig {
    /// Replaces the default blocklist when set.
    pub blocklist: Option<HeaderBlocklist>,
}

impl HeadersConfig {
    /// The configured blocklist, or the default policy.
    pub fn effective_blocklist(&self) -> HeaderBlocklist {
        self.blocklist.clone().unwrap_or_default()
    }
}

/// Error reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Logged when the body stream fails.
    pub streaming_message: String,

    /// Status applied when the body stream fails.
    pub streaming_status: u16,

    /// Logged when the outbound call itself fails.
    pub upstream_message: String,

    /// Status returned when the outbound call itself fails.
    pub upstream_status: u16,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            streaming_message: DEFAULT_STREAMING_MESSAGE.to_string(),
            streaming_status: 500,
            upstream_message: "Upstream request failed:".to_string(),
            upstream_status: 502,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for the handler to produce response headers.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
