//! Exchange state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Requesting → Streaming → Flushing → Done
//! Idle | Requesting | Streaming | Flushing → Failed
//! any state except Done | Aborted → Aborted
//! ```

/// Lifecycle of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Created, `request` not yet called.
    Idle,
    /// Building the request and waiting for the response head.
    Requesting,
    /// Response surfaced; reading and emitting body chunks.
    Streaming,
    /// Body exhausted; running the flush pass.
    Flushing,
    /// `on_end` delivered.
    Done,
    /// An error was reported. `network` marks transport-level failures.
    Failed { network: bool },
    /// Cancelled by the caller or after a non-network error.
    Aborted,
}

impl ExchangeState {
    /// Whether `abort` has anything to do from this state.
    pub fn can_abort(&self) -> bool {
        !matches!(self, ExchangeState::Done | ExchangeState::Aborted)
    }

    /// Forward transitions the pump is allowed to take.
    pub fn can_advance_to(&self, next: ExchangeState) -> bool {
        use ExchangeState::*;

        match (self, next) {
            (Idle, Requesting) | (Requesting, Streaming) | (Streaming, Flushing) | (Flushing, Done) => true,
            (Idle | Requesting | Streaming | Flushing, Failed { .. }) => true,
            (state, Aborted) => state.can_abort(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExchangeState::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Idle.can_advance_to(Requesting));
        assert!(Requesting.can_advance_to(Streaming));
        assert!(Streaming.can_advance_to(Flushing));
        assert!(Flushing.can_advance_to(Done));
    }

    #[test]
    fn test_no_skipping_or_rewinding() {
        assert!(!Idle.can_advance_to(Streaming));
        assert!(!Streaming.can_advance_to(Done));
        assert!(!Done.can_advance_to(Idle));
        assert!(!Failed { network: true }.can_advance_to(Streaming));
    }

    #[test]
    fn test_abort_rules() {
        assert!(Idle.can_abort());
        assert!(Streaming.can_abort());
        assert!(Failed { network: false }.can_abort());
        assert!(!Done.can_abort());
        assert!(!Aborted.can_abort());
        assert!(!Done.can_advance_to(Aborted));
    }
}
