//! Single-request streaming HTTP loader with a middleware pipeline.
//!
//! A [`Loader`] issues one request, streams the response body, and threads
//! every stage (request, response, each chunk, end of stream, error, abort)
//! through an ordered chain of [`ParamMod`] middleware.

pub mod config;
pub mod flow;
pub mod http;
pub mod loader;
pub mod observability;
pub mod params;

pub use config::LoaderConfig;
pub use http::{RequestContext, Transport};
pub use loader::{ExchangeOutcome, ExchangeState, Loader, LoaderError, LoaderSink};
pub use params::{AbortReason, ParamError, ParamMod};
