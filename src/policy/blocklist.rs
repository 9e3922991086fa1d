//! The set of header names that never cross the relay.

use serde::{Deserialize, Serialize};

/// Default blocklist: the fetch standard's forbidden header names, minus
/// `cookie`, `cookie2`, `origin`, `referer` and `user-agent`, which are
/// forwarded to keep session and identity context.
///
/// See <https://fetch.spec.whatwg.org/#forbidden-header-name>.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "accept-charset",
    "accept-encoding",
    "access-control-request-headers",
    "access-control-request-method",
    "connection",
    "content-length",
    "content-encoding",
    "date",
    "dnt",
    "expect",
    "host",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "via",
];

/// Ordered, de-duplicated set of lowercase header names.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HeaderBlocklist {
    names: Vec<String>,
}

impl HeaderBlocklist {
    /// Build a blocklist from arbitrary names.
    /// Names are lowercased; later duplicates are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_ascii_lowercase();
            if name.is_empty() || normalized.contains(&name) {
                continue;
            }
            normalized.push(name);
        }
        Self { names: normalized }
    }

    /// A blocklist that lets every header through.
    pub fn empty() -> Self {
        Self { names: Vec::new() }
    }

    /// Returns true if `name` is blocked (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|blocked| blocked.eq_ignore_ascii_case(name))
    }

    /// Blocked names in their configured order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for HeaderBlocklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKLIST)
    }
}

impl From<Vec<String>> for HeaderBlocklist {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<HeaderBlocklist> for Vec<String> {
    fn from(blocklist: HeaderBlocklist) -> Self {
        blocklist.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blocks_hop_by_hop() {
        let blocklist = HeaderBlocklist::default();
        for name in ["host", "via", "connection", "transfer-encoding", "content-length"] {
            assert!(blocklist.contains(name), "{name} should be blocked");
        }
        assert_eq!(blocklist.len(), DEFAULT_BLOCKLIST.len());
    }

    #[test]
    fn test_default_retains_identity_headers() {
        let blocklist = HeaderBlocklist::default();
        for name in ["cookie", "cookie2", "origin", "referer", "user-agent"] {
            assert!(!blocklist.contains(name), "{name} must be forwarded");
        }
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let blocklist = HeaderBlocklist::default();
        assert!(blocklist.contains("Host"));
        assert!(blocklist.contains("TRANSFER-ENCODING"));
        assert!(!blocklist.contains("Cookie"));
    }

    #[test]
    fn test_new_normalizes_and_dedups() {
        let blocklist = HeaderBlocklist::new(["X-Secret", "x-secret", " Via ", "", "host"]);
        let names: Vec<&str> = blocklist.names().collect();
        assert_eq!(names, vec!["x-secret", "via", "host"]);
    }

    #[test]
    fn test_deserialize_from_list() {
        #[derive(Deserialize)]
        struct Wrapper {
            blocklist: HeaderBlocklist,
        }

        let parsed: Wrapper = toml::from_str(r#"blocklist = ["Authorization", "host"]"#).unwrap();
        assert!(parsed.blocklist.contains("authorization"));
        assert!(parsed.blocklist.contains("host"));
        assert!(!parsed.blocklist.contains("via"));
    }
}
