//! Loader orchestrator: one instance drives one request/response exchange.
//!
//! # Data Flow
//! ```text
//! Loader::request(ctx, sink)
//!     → pump.rs (build request, fetch, build response, stream, flush)
//!     → on error: params.on_error → sink.on_error → abort (non-network only)
//!
//! Loader::pause / resume (any task)   → FlowGate checked before each emission
//! Loader::abort (any task)            → CancelToken + params.on_abort
//! ```
//!
//! # Design Decisions
//! - The loader is shared behind `Arc` so control calls can come from other tasks
//! - State lives in an explicit `ExchangeState`; the std mutex is never held
//!   across an await or while calling out to middleware or the sink
//! - The middleware chain sits behind an async mutex: it is held while a hook
//!   runs, so `abort` waits for a running hook instead of interrupting it
//! - Emission also holds the chain lock, so no buffer reaches the sink after
//!   `on_abort` fired. A sink may still call `pause`/`resume` from `on_data`

pub mod error;
mod pump;
pub mod sink;
pub mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::config::LoaderConfig;
use crate::flow::{CancelToken, FlowError, FlowGate};
use crate::http::{ReqwestTransport, RequestContext, Transport};
use crate::observability::metrics;
use crate::params::{build_chain, AbortReason, ParamChain, ParamMod};

pub use error::{ExchangeOutcome, LoaderError};
pub use sink::{LoaderSink, WriterSink};
pub use state::ExchangeState;

struct LoaderInner {
    state: ExchangeState,
    gate: Option<FlowGate>,
}

/// Drives a single streaming request through a middleware chain.
pub struct Loader {
    url: Url,
    exchange_id: Uuid,
    transport: Arc<dyn Transport>,
    params: tokio::sync::Mutex<ParamChain>,
    cancel: CancelToken,
    inner: Mutex<LoaderInner>,
    bytes_read: AtomicU64,
}

impl Loader {
    /// Create a loader for `url` with an already resolved middleware chain.
    pub fn new(url: Url, params: Vec<Box<dyn ParamMod>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url,
            exchange_id: Uuid::new_v4(),
            transport,
            params: tokio::sync::Mutex::new(ParamChain::new(params)),
            cancel: CancelToken::new(),
            inner: Mutex::new(LoaderInner {
                state: ExchangeState::Idle,
                gate: None,
            }),
            bytes_read: AtomicU64::new(0),
        }
    }

    /// Resolve middleware from configuration and use the reqwest transport.
    ///
    /// Parameter errors surface here, before any network activity.
    pub fn from_config(url: Url, config: &LoaderConfig) -> Result<Self, LoaderError> {
        let params = build_chain(&config.params)?;
        let transport = ReqwestTransport::new(&config.transport).map_err(LoaderError::Setup)?;
        Ok(Self::new(url, params, Arc::new(transport)))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn exchange_id(&self) -> Uuid {
        self.exchange_id
    }

    /// Bytes delivered to the consumer so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ExchangeState {
        self.lock_inner().state
    }

    pub fn is_paused(&self) -> bool {
        self.lock_inner().gate.is_some()
    }

    /// Run the exchange. Never fails; the returned outcome tells how it
    /// settled. Errors have already been reported to the middleware and to
    /// `sink` by the time this returns.
    pub async fn request<S>(&self, ctx: &RequestContext, sink: &mut S) -> ExchangeOutcome
    where
        S: LoaderSink + ?Sized,
    {
        let span = tracing::info_span!(
            "exchange",
            exchange_id = %self.exchange_id,
            url = %self.url,
        );
        self.run(ctx, sink).instrument(span).await
    }

    async fn run<S>(&self, ctx: &RequestContext, sink: &mut S) -> ExchangeOutcome
    where
        S: LoaderSink + ?Sized,
    {
        {
            let mut inner = self.lock_inner();
            let current = inner.state;
            match current {
                ExchangeState::Idle => inner.state = ExchangeState::Requesting,
                ExchangeState::Aborted => {
                    tracing::debug!("Exchange aborted before it started");
                    return ExchangeOutcome::Aborted;
                }
                state => {
                    tracing::warn!(state = ?state, "Loader reused after exchange started");
                    return ExchangeOutcome::Failed(Arc::new(LoaderError::AlreadyStarted));
                }
            }
        }

        metrics::record_exchange_started();
        let params = self.params.lock().await.len();
        tracing::debug!(method = %ctx.method, params, "Exchange started");

        let outcome = match self.pump(ctx, sink).await {
            Ok(()) => {
                tracing::info!(bytes_read = self.bytes_read(), "Exchange completed");
                ExchangeOutcome::Completed
            }
            Err(err) => self.settle_error(err, sink).await,
        };

        metrics::record_exchange_outcome(outcome.label());
        outcome
    }

    /// Apply the error policy: report to middleware then consumer, then
    /// abort unless the transport is already gone.
    async fn settle_error<S>(&self, err: LoaderError, sink: &mut S) -> ExchangeOutcome
    where
        S: LoaderSink + ?Sized,
    {
        let network = err.is_network();
        {
            let mut inner = self.lock_inner();
            if inner.state == ExchangeState::Aborted {
                tracing::debug!(error = %err, "Error after abort suppressed");
                return ExchangeOutcome::Aborted;
            }
            inner.state = ExchangeState::Failed { network };
        }

        let err = Arc::new(err);
        tracing::warn!(error = %err, network, "Exchange failed");

        self.params.lock().await.on_error(&err);
        sink.on_error(&err);

        if !network {
            self.abort(AbortReason::Error(err.clone())).await;
        }

        ExchangeOutcome::Failed(err)
    }

    /// Stall emission (and therefore further reads) until `resume`.
    pub fn pause(&self) -> Result<(), FlowError> {
        let mut inner = self.lock_inner();
        if inner.gate.is_some() {
            return Err(FlowError::AlreadyPaused);
        }
        inner.gate = Some(FlowGate::new());
        tracing::debug!(exchange_id = %self.exchange_id, "Paused");
        Ok(())
    }

    /// Release the installed gate, if any.
    pub fn resume(&self) {
        let gate = self.lock_inner().gate.take();
        if let Some(gate) = gate {
            gate.release();
            tracing::debug!(exchange_id = %self.exchange_id, "Resumed");
        }
    }

    /// Cancel the exchange. No-op once done or already aborted.
    pub async fn abort(&self, reason: AbortReason) {
        {
            let mut inner = self.lock_inner();
            if !inner.state.can_abort() {
                tracing::debug!(state = ?inner.state, "Abort ignored");
                return;
            }
            inner.state = ExchangeState::Aborted;
        }

        tracing::info!(exchange_id = %self.exchange_id, reason = %reason, "Aborting exchange");
        self.cancel.cancel();
        self.params.lock().await.on_abort(&reason);
    }

    /// Move the pump forward, refusing once aborted.
    fn advance(&self, next: ExchangeState) -> Result<(), LoaderError> {
        let mut inner = self.lock_inner();
        let from = inner.state;
        if from == ExchangeState::Aborted {
            return Err(LoaderError::Aborted);
        }
        if !from.can_advance_to(next) {
            return Err(LoaderError::InvalidTransition { from, to: next });
        }
        tracing::trace!(from = ?from, to = ?next, "State transition");
        inner.state = next;
        Ok(())
    }

    fn lock_inner(&self) -> MutexGuard<'_, LoaderInner> {
        self.inner.lock().expect("loader state mutex poisoned")
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("url", &self.url.as_str())
            .field("exchange_id", &self.exchange_id)
            .field("state", &self.state())
            .field("bytes_read", &self.bytes_read())
            .finish()
    }
}
