//! Request correlation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::Span;

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

/// Identifier attached to every log line of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new request ID.
    ///
    /// Format: `req_<millis>_<counter>`, unique within a process.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
        Self(format!("req_{:x}_{:04x}", millis, seq))
    }

    /// Use an ID supplied by the caller (e.g. an `x-request-id` header).
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let valid = !value.is_empty()
            && value.len() <= 128
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        valid.then(|| Self(value.to_string()))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Span wrapping the handling of one request.
pub fn request_span(request_id: &RequestId, method: &str, path: &str) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id,
        method,
        path,
    )
}
