//! Transport abstraction consumed by the loader.
//!
//! A transport performs one HTTP-like request and hands back the response
//! head plus a lazily read body. Implementations must honour the
//! [`CancelSignal`](crate::flow::CancelSignal) carried in the request args:
//! once cancelled, pending and future calls fail with
//! [`TransportError::Cancelled`].

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::http::request::RequestArgs;
use crate::http::response::ResponseHead;

/// Errors produced by the transport layer. All of them are network errors
/// from the loader's point of view.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request was cancelled through its signal.
    #[error("request cancelled")]
    Cancelled,

    /// Connection-level failure reported by a non-reqwest transport.
    #[error("connection error: {0}")]
    Connection(String),
}

/// Incremental reader over a response body.
#[async_trait]
pub trait BodyStream: Send {
    /// Read the next chunk. `Ok(None)` marks the end of the stream.
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError>;
}

/// Result of a successful fetch.
pub struct TransportResponse {
    pub head: ResponseHead,
    /// `None` when the response carries no readable body.
    pub body: Option<Box<dyn BodyStream>>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("head", &self.head)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Something that can perform a request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url, req: RequestArgs) -> Result<TransportResponse, TransportError>;
}
