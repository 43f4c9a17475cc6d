//! Stream pump: the sequential body of an exchange.
//!
//! # Stages
//! ```text
//! request build → fetch → status check → response build → on_response
//!     → loop { read chunk → param chain → gate → emit }
//!     → flush pass → gate → emit → on_end
//! ```
//!
//! Every stage runs on the caller's task. A closed flow gate stalls the
//! loop right before emission, which also delays the next read.

use std::sync::atomic::Ordering;

use bytes::Bytes;
use reqwest::StatusCode;

use crate::flow::CancelSignal;
use crate::http::{RequestArgs, RequestContext, ResponseArgs, TransportResponse};
use crate::loader::{ExchangeState, Loader, LoaderError, LoaderSink};
use crate::observability::metrics;

impl Loader {
    pub(super) async fn pump<S>(&self, ctx: &RequestContext, sink: &mut S) -> Result<(), LoaderError>
    where
        S: LoaderSink + ?Sized,
    {
        let mut req = RequestArgs::from_context(ctx);
        self.params.lock().await.on_request(&mut req, ctx)?;
        req.signal = Some(self.cancel.signal());

        let TransportResponse { head, body } = self
            .transport
            .fetch(&self.url, req)
            .await
            .map_err(LoaderError::Network)?;

        if head.status != StatusCode::OK {
            return Err(LoaderError::InvalidStatus(head.status.as_u16()));
        }

        let mut res = ResponseArgs::from_head(&head);
        self.params.lock().await.on_response(&mut res, ctx, &head)?;

        self.advance(ExchangeState::Streaming)?;
        sink.on_response(&res);

        let mut body = body.ok_or(LoaderError::Cors)?;
        let mut signal = self.cancel.signal();

        loop {
            let chunk = match body.read().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(LoaderError::Network(e)),
            };
            tracing::trace!(len = chunk.len(), "Chunk received");

            let buf = self.params.lock().await.on_data(chunk).await?;
            if buf.is_empty() {
                continue;
            }
            self.emit(buf, sink, &mut signal).await?;
        }

        self.advance(ExchangeState::Flushing)?;
        let tail = self.params.lock().await.on_end().await?;
        if !tail.is_empty() {
            tracing::trace!(len = tail.len(), "Flush produced trailing bytes");
            self.emit(tail, sink, &mut signal).await?;
        }

        self.advance(ExchangeState::Done)?;
        sink.on_end();
        Ok(())
    }

    /// Deliver one buffer: wait on the gate, count, hand to the sink.
    async fn emit<S>(&self, buf: Bytes, sink: &mut S, signal: &mut CancelSignal) -> Result<(), LoaderError>
    where
        S: LoaderSink + ?Sized,
    {
        let waiter = self.lock_inner().gate.as_ref().map(|gate| gate.waiter());
        if let Some(waiter) = waiter {
            tracing::debug!(pending = buf.len(), "Emission suspended");
            tokio::select! {
                _ = waiter.wait() => {}
                _ = signal.cancelled() => return Err(LoaderError::Aborted),
            }
        }

        // `abort` runs `on_abort` under the chain lock, so holding it here
        // orders every emission strictly before or after the abort.
        let _chain = self.params.lock().await;
        if self.state() == ExchangeState::Aborted {
            return Err(LoaderError::Aborted);
        }

        let len = buf.len() as u64;
        self.bytes_read.fetch_add(len, Ordering::SeqCst);
        metrics::record_bytes(len);
        sink.on_data(buf);
        Ok(())
    }
}
