//! Metrics collection.
//!
//! # Metrics
//! - `loader_exchanges_started_total` (counter)
//! - `loader_exchanges_total` (counter): settled exchanges by `outcome`
//! - `loader_bytes_total` (counter): bytes delivered to consumers
//!
//! # Design Decisions
//! - Uses the `metrics` facade; no-ops until a recorder is installed
//! - Bytes are counted after the middleware chain, like `bytes_read`

pub fn record_exchange_started() {
    metrics::counter!("loader_exchanges_started_total").increment(1);
}

/// Record how an exchange settled (`completed`, `failed`, `aborted`).
pub fn record_exchange_outcome(outcome: &'static str) {
    metrics::counter!("loader_exchanges_total", "outcome" => outcome).increment(1);
}

pub fn record_bytes(len: u64) {
    metrics::counter!("loader_bytes_total").increment(len);
}
