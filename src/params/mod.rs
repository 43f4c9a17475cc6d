//! Middleware ("param mods") and the ordered chain that drives them.
//!
//! # Data Flow
//! ```text
//! LoaderConfig.params
//!     → build_chain (resolve parameters, may fail with ParamError)
//!     → Vec<Box<dyn ParamMod>> handed to Loader::new
//!     → ParamChain invokes hooks in declared order at every stage:
//!         on_request → on_response → on_data* → on_end
//!         on_error / on_abort on failure or cancellation
//! ```
//!
//! # Design Decisions
//! - Every hook has a no-op default; middleware implements what it needs
//! - Data hooks are async, metadata hooks are synchronous
//! - A chunk reduced to zero bytes stops travelling down the chain

pub mod chain;
pub mod headers;
pub mod size;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::ParamConfig;
use crate::http::{RequestArgs, RequestContext, ResponseArgs, ResponseHead};
use crate::loader::LoaderError;

pub use chain::ParamChain;
pub use headers::HeadersParam;
pub use size::SizeParam;

/// Errors raised while resolving or running middleware parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("body size {actual} exceeds limit {limit}")]
    SizeExceeded { actual: u64, limit: u64 },

    #[error("body size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("invalid param '{param}': {reason}")]
    Invalid { param: &'static str, reason: String },
}

/// Why an exchange was aborted.
#[derive(Debug, Clone)]
pub enum AbortReason {
    /// The caller cancelled the exchange.
    Caller(String),
    /// The loader aborted after reporting this error.
    Error(Arc<LoaderError>),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Caller(reason) => write!(f, "cancelled: {}", reason),
            AbortReason::Error(err) => write!(f, "failed: {}", err),
        }
    }
}

/// A middleware participating in one exchange.
///
/// Hooks run sequentially on the exchange's task, in chain order. A hook
/// returning `Err` fails the exchange.
#[async_trait]
pub trait ParamMod: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Rewrite the outgoing request before it is sent.
    fn on_request(&mut self, _req: &mut RequestArgs, _ctx: &RequestContext) -> Result<(), ParamError> {
        Ok(())
    }

    /// Rewrite the response descriptor before the consumer sees it.
    fn on_response(
        &mut self,
        _res: &mut ResponseArgs,
        _ctx: &RequestContext,
        _raw: &ResponseHead,
    ) -> Result<(), ParamError> {
        Ok(())
    }

    /// Transform one chunk. Returning an empty buffer absorbs the chunk:
    /// later middleware do not see it and nothing is emitted for it.
    async fn on_data(&mut self, chunk: Bytes) -> Result<Bytes, ParamError> {
        Ok(chunk)
    }

    /// Flush pass at end of stream. Receives the previous middleware's
    /// output (empty for the first) and returns trailing bytes.
    async fn on_end(&mut self, buf: Bytes) -> Result<Bytes, ParamError> {
        Ok(buf)
    }

    fn on_abort(&mut self, _reason: &AbortReason) {}

    fn on_error(&mut self, _err: &LoaderError) {}
}

/// Resolve configured parameters into middleware, in declared order.
pub fn build_chain(configs: &[ParamConfig]) -> Result<Vec<Box<dyn ParamMod>>, ParamError> {
    configs
        .iter()
        .map(|config| -> Result<Box<dyn ParamMod>, ParamError> {
            match config {
                ParamConfig::Headers { values } => Ok(Box::new(HeadersParam::from_pairs(values)?)),
                ParamConfig::Size { expected, max } => Ok(Box::new(SizeParam::new(*expected, *max)?)),
            }
        })
        .collect()
}
