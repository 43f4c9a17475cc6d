//! Outgoing request description.
//!
//! # Responsibilities
//! - Carry the caller's method/body/referrer into the exchange
//! - Expose a mutable header map for middleware
//! - Carry the cancellation signal to the transport
//!
//! # Design Decisions
//! - Requests start with the `same-origin` referrer policy; middleware may
//!   change it, and the transport honours whatever policy it finds
//! - Headers start empty; only middleware adds them

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;

use crate::flow::CancelSignal;

/// Which referrer, if any, the transport discloses to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferrerPolicy {
    /// Never send a referrer.
    NoReferrer,
    /// Send it only when scheme, host and port match the target.
    #[default]
    SameOrigin,
    /// Always send it.
    UnsafeUrl,
}

impl ReferrerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferrerPolicy::NoReferrer => "no-referrer",
            ReferrerPolicy::SameOrigin => "same-origin",
            ReferrerPolicy::UnsafeUrl => "unsafe-url",
        }
    }
}

impl std::fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-side description of the request to perform.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub body: Option<Bytes>,
    pub referrer: Option<String>,
}

impl RequestContext {
    /// A plain GET with no body and no referrer.
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            referrer: None,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::get()
    }
}

/// Request descriptor, rewritten in place by each middleware's `on_request`.
#[derive(Debug, Clone)]
pub struct RequestArgs {
    pub method: Method,
    pub body: Option<Bytes>,
    pub referrer: Option<String>,
    pub referrer_policy: ReferrerPolicy,
    pub headers: HeaderMap,
    /// Bound by the loader after middleware ran, right before the fetch.
    pub signal: Option<CancelSignal>,
}

impl RequestArgs {
    /// Seed a descriptor from the caller's context.
    pub fn from_context(ctx: &RequestContext) -> Self {
        Self {
            method: ctx.method.clone(),
            body: ctx.body.clone(),
            referrer: ctx.referrer.clone(),
            referrer_policy: ReferrerPolicy::SameOrigin,
            headers: HeaderMap::new(),
            signal: None,
        }
    }
}
