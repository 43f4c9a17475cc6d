//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Loader / pump / transport produce:
//!     → logging.rs (structured log events, one span per exchange)
//!     → metrics.rs (exchange and byte counters)
//!
//! Consumers:
//!     → stderr via tracing-subscriber (binary only)
//!     → whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing subscribers/recorders is the
//!   binary's (or embedder's) job
//! - Exchange ID flows through every event via the exchange span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
