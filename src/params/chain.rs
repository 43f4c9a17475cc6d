//! Ordered middleware chain.

use bytes::Bytes;

use crate::http::{RequestArgs, RequestContext, ResponseArgs, ResponseHead};
use crate::loader::LoaderError;
use crate::params::{AbortReason, ParamError, ParamMod};

/// Middleware in invocation order, fixed for the lifetime of an exchange.
pub struct ParamChain {
    mods: Vec<Box<dyn ParamMod>>,
}

impl ParamChain {
    pub fn new(mods: Vec<Box<dyn ParamMod>>) -> Self {
        Self { mods }
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn on_request(&mut self, req: &mut RequestArgs, ctx: &RequestContext) -> Result<(), ParamError> {
        for param in self.mods.iter_mut() {
            param.on_request(req, ctx)?;
        }
        Ok(())
    }

    pub fn on_response(
        &mut self,
        res: &mut ResponseArgs,
        ctx: &RequestContext,
        raw: &ResponseHead,
    ) -> Result<(), ParamError> {
        for param in self.mods.iter_mut() {
            param.on_response(res, ctx, raw)?;
        }
        Ok(())
    }

    /// Thread one chunk through the chain.
    ///
    /// Stops at the first middleware that returns an empty buffer and
    /// returns that empty buffer.
    pub async fn on_data(&mut self, chunk: Bytes) -> Result<Bytes, ParamError> {
        let mut buf = chunk;
        for param in self.mods.iter_mut() {
            buf = param.on_data(buf).await?;
            if buf.is_empty() {
                tracing::trace!(param = param.name(), "Chunk absorbed");
                break;
            }
        }
        Ok(buf)
    }

    /// Run the flush pass. Every middleware runs exactly once, whatever the
    /// length of the buffer handed to it.
    pub async fn on_end(&mut self) -> Result<Bytes, ParamError> {
        let mut buf = Bytes::new();
        for param in self.mods.iter_mut() {
            buf = param.on_end(buf).await?;
        }
        Ok(buf)
    }

    pub fn on_error(&mut self, err: &LoaderError) {
        for param in self.mods.iter_mut() {
            param.on_error(err);
        }
    }

    pub fn on_abort(&mut self, reason: &AbortReason) {
        for param in self.mods.iter_mut() {
            param.on_abort(reason);
        }
    }
}

impl std::fmt::Debug for ParamChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.mods.iter().map(|m| m.name()))
            .finish()
    }
}
