//! Body size enforcement.

use async_trait::async_trait;
use bytes::Bytes;

use crate::params::{ParamError, ParamMod};

/// Fails the exchange when the body outgrows `max` (checked per chunk) or
/// does not end at exactly `expected` bytes (checked at flush).
#[derive(Debug, Clone)]
pub struct SizeParam {
    expected: Option<u64>,
    max: Option<u64>,
    seen: u64,
}

impl SizeParam {
    pub fn new(expected: Option<u64>, max: Option<u64>) -> Result<Self, ParamError> {
        match (expected, max) {
            (None, None) => {
                return Err(ParamError::Invalid {
                    param: "size",
                    reason: "either expected or max is required".into(),
                })
            }
            (Some(expected), Some(max)) if expected > max => {
                return Err(ParamError::Invalid {
                    param: "size",
                    reason: format!("expected {} exceeds max {}", expected, max),
                })
            }
            _ => {}
        }
        Ok(Self { expected, max, seen: 0 })
    }

    /// Bytes observed so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    fn limit(&self) -> Option<u64> {
        match (self.expected, self.max) {
            (Some(expected), Some(max)) => Some(expected.min(max)),
            (expected, max) => expected.or(max),
        }
    }
}

#[async_trait]
impl ParamMod for SizeParam {
    fn name(&self) -> &'static str {
        "size"
    }

    async fn on_data(&mut self, chunk: Bytes) -> Result<Bytes, ParamError> {
        self.seen += chunk.len() as u64;
        if let Some(limit) = self.limit() {
            if self.seen > limit {
                return Err(ParamError::SizeExceeded {
                    actual: self.seen,
                    limit,
                });
            }
        }
        Ok(chunk)
    }

    async fn on_end(&mut self, buf: Bytes) -> Result<Bytes, ParamError> {
        self.seen += buf.len() as u64;
        match self.expected {
            Some(expected) if expected != self.seen => Err(ParamError::SizeMismatch {
                expected,
                actual: self.seen,
            }),
            _ => Ok(buf),
        }
    }
}
