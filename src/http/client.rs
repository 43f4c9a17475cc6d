//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Issue the request built by the loader
//! - Stream the response body chunk by chunk
//! - Race every await against the exchange's cancel signal
//!
//! # Design Decisions
//! - Status codes are not interpreted here; the loader owns that policy
//! - `Referer` follows the request's referrer policy (`same-origin` unless a
//!   middleware changed it)
//! - No retries; a failed call is reported as-is

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderValue, REFERER};
use reqwest::Client;
use url::Url;

use crate::config::TransportConfig;
use crate::flow::CancelSignal;
use crate::http::request::{ReferrerPolicy, RequestArgs};
use crate::http::response::ResponseHead;
use crate::http::transport::{BodyStream, Transport, TransportError, TransportResponse};

/// Default transport built on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone());

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &Url, req: RequestArgs) -> Result<TransportResponse, TransportError> {
        let RequestArgs {
            method,
            body,
            referrer,
            referrer_policy,
            mut headers,
            mut signal,
        } = req;

        if !headers.contains_key(REFERER) {
            if let Some(value) = referrer
                .as_deref()
                .and_then(|r| referrer_for(referrer_policy, r, url))
                .and_then(|r| HeaderValue::from_str(&r).ok())
            {
                headers.insert(REFERER, value);
            }
        }

        let mut builder = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = until_cancelled(signal.as_mut(), builder.send()).await??;

        tracing::debug!(
            status = %response.status(),
            content_length = ?response.content_length(),
            "Response head received"
        );

        // hyper only records the phrase when it differs from the canonical one
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok());
        let head = ResponseHead::new(response.status(), response.headers().clone()).with_reason(reason);
        let body = ReqwestBody {
            stream: response.bytes_stream().boxed(),
            signal,
        };

        Ok(TransportResponse {
            head,
            body: Some(Box::new(body)),
        })
    }
}

struct ReqwestBody {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
    signal: Option<CancelSignal>,
}

#[async_trait]
impl BodyStream for ReqwestBody {
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        let next = until_cancelled(self.signal.as_mut(), self.stream.next()).await?;
        next.transpose().map_err(TransportError::from)
    }
}

/// Drive `fut` unless the signal fires first.
async fn until_cancelled<F: Future>(
    signal: Option<&mut CancelSignal>,
    fut: F,
) -> Result<F::Output, TransportError> {
    match signal {
        Some(signal) => {
            tokio::select! {
                biased;
                _ = signal.cancelled() => Err(TransportError::Cancelled),
                out = fut => Ok(out),
            }
        }
        None => Ok(fut.await),
    }
}

/// The referrer to disclose to `target` under `policy`. Fragments and
/// credentials are never sent.
pub fn referrer_for(policy: ReferrerPolicy, referrer: &str, target: &Url) -> Option<String> {
    let mut referrer = Url::parse(referrer).ok()?;
    match policy {
        ReferrerPolicy::NoReferrer => return None,
        ReferrerPolicy::SameOrigin if referrer.origin() != target.origin() => return None,
        _ => {}
    }
    referrer.set_fragment(None);
    let _ = referrer.set_username("");
    let _ = referrer.set_password(None);
    Some(referrer.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::request::ReferrerPolicy::*;

    #[test]
    fn test_same_origin_referrer_kept() {
        let target = Url::parse("https://cdn.example.com/file.bin").unwrap();
        let referrer = referrer_for(SameOrigin, "https://user:pw@cdn.example.com/index.html#top", &target);
        assert_eq!(referrer.as_deref(), Some("https://cdn.example.com/index.html"));
    }

    #[test]
    fn test_cross_origin_referrer_dropped() {
        let target = Url::parse("https://cdn.example.com/file.bin").unwrap();
        assert!(referrer_for(SameOrigin, "https://example.com/", &target).is_none());
        assert!(referrer_for(SameOrigin, "http://cdn.example.com/", &target).is_none());
        assert!(referrer_for(SameOrigin, "https://cdn.example.com:8443/", &target).is_none());
    }

    #[test]
    fn test_policy_controls_disclosure() {
        let target = Url::parse("https://cdn.example.com/file.bin").unwrap();
        assert!(referrer_for(NoReferrer, "https://cdn.example.com/", &target).is_none());
        assert_eq!(
            referrer_for(UnsafeUrl, "https://example.com/page#x", &target).as_deref(),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn test_invalid_referrer_dropped() {
        let target = Url::parse("https://cdn.example.com/file.bin").unwrap();
        assert!(referrer_for(SameOrigin, "not a url", &target).is_none());
    }

    #[test]
    fn test_transport_builds_from_default_config() {
        let transport = ReqwestTransport::new(&TransportConfig::default());
        assert!(transport.is_ok());
    }
}
