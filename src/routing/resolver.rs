//! Target URL extraction from the inbound request path.
//!
//! Two path forms are accepted:
//! - `/go/<target>`: namespaced form
//! - `/<target>`: legacy form, the whole remainder is the target

use std::fmt;

use crate::error::ResolveError;

/// First path segment that selects the namespaced form.
pub const GO_MARKER: &str = "go";

/// Destination URL taken from the request path.
///
/// Serves both as the cache key and as the outbound request URI, so it is
/// kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the target URL from a request's path and query.
///
/// The query string is part of the target: `/go/http://h/x?a=1` targets
/// `http://h/x?a=1`.
pub fn resolve(path_and_query: &str) -> Result<TargetUrl, ResolveError> {
    let stripped = path_and_query.strip_prefix('/').unwrap_or(path_and_query);

    let mut parts = stripped.splitn(2, '/');
    if parts.next() == Some(GO_MARKER) {
        return match parts.next() {
            Some(target) if !target.is_empty() => Ok(TargetUrl::new(target)),
            _ => Err(ResolveError::MissingTarget(path_and_query.to_string())),
        };
    }

    Ok(TargetUrl::new(stripped))
}
