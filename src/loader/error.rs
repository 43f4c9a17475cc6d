//! Exchange error types.

use std::sync::Arc;

use thiserror::Error;

use crate::http::TransportError;
use crate::loader::state::ExchangeState;
use crate::params::ParamError;

/// Errors reported by an exchange.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A middleware parameter could not be resolved or rejected the data.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// The transport call or a body read failed outright.
    #[error("network error: {0}")]
    Network(#[source] TransportError),

    /// The response status was not 200.
    #[error("invalid http status. code: {0}")]
    InvalidStatus(u16),

    /// The response advertised no readable body.
    #[error("cors error")]
    Cors,

    /// The exchange was aborted while in flight.
    #[error("exchange aborted")]
    Aborted,

    /// `request` was called on a loader that already ran.
    #[error("loader already used")]
    AlreadyStarted,

    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: ExchangeState, to: ExchangeState },

    /// The transport could not be constructed.
    #[error("transport setup failed: {0}")]
    Setup(#[source] TransportError),
}

impl LoaderError {
    /// Transport-level failure. These do not trigger a follow-up abort.
    pub fn is_network(&self) -> bool {
        matches!(self, LoaderError::Network(_))
    }

    /// The server answered, but not with a usable response.
    pub fn is_protocol(&self) -> bool {
        matches!(self, LoaderError::InvalidStatus(_) | LoaderError::Cors)
    }
}

/// How an exchange settled.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    Completed,
    Failed(Arc<LoaderError>),
    Aborted,
}

impl ExchangeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExchangeOutcome::Completed)
    }

    pub fn error(&self) -> Option<&LoaderError> {
        match self {
            ExchangeOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Completed => "completed",
            ExchangeOutcome::Failed(_) => "failed",
            ExchangeOutcome::Aborted => "aborted",
        }
    }
}
