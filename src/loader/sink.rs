//! Consumer callbacks.

use std::io::{self, Write};

use bytes::Bytes;

use crate::http::ResponseArgs;
use crate::loader::LoaderError;

/// Receives the observable side effects of an exchange.
///
/// `on_response`, `on_end` and `on_error` fire at most once; `on_data`
/// fires for every non-empty buffer, in stream order.
pub trait LoaderSink: Send {
    fn on_response(&mut self, _res: &ResponseArgs) {}

    fn on_data(&mut self, chunk: Bytes);

    fn on_end(&mut self) {}

    fn on_error(&mut self, _err: &LoaderError) {}
}

type WriteErrorHook = Box<dyn FnOnce(&io::Error) + Send>;

/// Writes the body to any `Write` target.
///
/// The first write failure is kept and reported through
/// [`WriterSink::finish`]; later chunks are dropped. The sink cannot stop the
/// download itself, so callers that want the exchange cancelled on a failed
/// write register a hook with [`WriterSink::on_write_error`].
pub struct WriterSink<W: Write + Send> {
    writer: W,
    written: u64,
    error: Option<io::Error>,
    on_write_error: Option<WriteErrorHook>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
            on_write_error: None,
        }
    }

    /// Run `hook` once, on the first failed write.
    pub fn on_write_error<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&io::Error) + Send + 'static,
    {
        self.on_write_error = Some(Box::new(hook));
        self
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and return the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write + Send> LoaderSink for WriterSink<W> {
    fn on_response(&mut self, res: &ResponseArgs) {
        tracing::debug!(status = %res.status, "Writing response body");
    }

    fn on_data(&mut self, chunk: Bytes) {
        if self.error.is_some() {
            return;
        }
        match self.writer.write_all(&chunk) {
            Ok(()) => self.written += chunk.len() as u64,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write chunk");
                if let Some(hook) = self.on_write_error.take() {
                    hook(&e);
                }
                self.error = Some(e);
            }
        }
    }
}
