//! HTTP descriptors and the transport seam.
//!
//! # Data Flow
//! ```text
//! RequestContext (caller)
//!     → request.rs (RequestArgs built, rewritten by middleware)
//!     → transport.rs (Transport::fetch → ResponseHead + BodyStream)
//!     → response.rs (ResponseArgs built, rewritten by middleware)
//!     → consumer
//! ```
//!
//! # Design Decisions
//! - Descriptors are plain mutable values; middleware edits them in place
//! - The transport is a trait so the loader never depends on reqwest directly
//! - `client.rs` provides the reqwest-backed default transport

pub mod client;
pub mod request;
pub mod response;
pub mod transport;

pub use client::ReqwestTransport;
pub use request::{ReferrerPolicy, RequestArgs, RequestContext};
pub use response::{ResponseArgs, ResponseHead};
pub use transport::{BodyStream, Transport, TransportError, TransportResponse};
