//! One-shot suspend/resume gate used for consumer-driven backpressure.

use thiserror::Error;
use tokio::sync::watch;

/// Errors raised by misuse of the flow gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// `pause` was called while a gate was already installed.
    #[error("flow gate already installed; resume before pausing again")]
    AlreadyPaused,
}

/// A closed gate. Releasing it opens it for good.
#[derive(Debug)]
pub struct FlowGate {
    tx: watch::Sender<bool>,
}

impl FlowGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Get a handle that can wait for the gate to open.
    pub fn waiter(&self) -> GateWaiter {
        GateWaiter {
            rx: self.tx.subscribe(),
        }
    }

    /// Open the gate, waking every waiter.
    pub fn release(self) {
        self.tx.send_replace(true);
    }
}

impl Default for FlowGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Waiting side of a [`FlowGate`].
#[derive(Debug)]
pub struct GateWaiter {
    rx: watch::Receiver<bool>,
}

impl GateWaiter {
    /// Suspend until the gate is released.
    ///
    /// A gate dropped without release counts as open.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|open| *open).await;
    }
}
