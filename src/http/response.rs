//! Incoming response description.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Raw response metadata as reported by the transport. Read-only for middleware.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Build a head using the canonical reason phrase as status text.
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
        }
    }

    /// Replace the status text with the phrase the server actually sent.
    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        if let Some(reason) = reason {
            self.status_text = reason.to_string();
        }
        self
    }
}

/// Response descriptor, rewritten in place by each middleware's `on_response`
/// before the consumer sees it.
#[derive(Debug, Clone)]
pub struct ResponseArgs {
    pub status: StatusCode,
    pub status_text: String,
    /// Starts empty; raw headers are only reachable through [`ResponseHead`].
    pub headers: HeaderMap,
}

impl ResponseArgs {
    pub fn from_head(head: &ResponseHead) -> Self {
        Self {
            status: head.status,
            status_text: head.status_text.clone(),
            headers: HeaderMap::new(),
        }
    }
}
