//! Flow control primitives shared by the loader and its transport.
//!
//! # Data Flow
//! ```text
//! Loader::pause()  → installs FlowGate
//!     → pump reaches emission point → GateWaiter::wait() suspends
//! Loader::resume() → FlowGate::release() → pump continues
//!
//! Loader::abort()  → CancelToken::cancel()
//!     → every CancelSignal clone observes the cancel
//!     → in-flight fetch / body read fails, suspended pump wakes
//! ```
//!
//! # Design Decisions
//! - Both primitives are thin wrappers over `tokio::sync::watch`
//! - Signals are cloneable and can be handed to transports
//! - Neither primitive interrupts running middleware; they only affect awaits

pub mod cancel;
pub mod gate;

pub use cancel::{CancelSignal, CancelToken};
pub use gate::{FlowError, FlowGate, GateWaiter};
