//! Cooperative render-control signal
//!
//! Cancellation is cooperative only: the worker thread polls the signal
//! between major units of work (tiles or passes). There is no preemptive
//! termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort/pause flags polled by the renderer's inner loop
#[derive(Debug, Clone, Default)]
pub struct RenderSignal {
    abort: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl RenderSignal {
    /// Fresh signal with nothing requested
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative abort
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// Whether an abort has been requested
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Request the worker to idle between units of work
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    /// Let a paused worker continue
    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    /// Whether a pause is in effect
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// Clear both flags before a new render pass
    pub fn reset(&self) {
        self.abort.store(false, Ordering::SeqCst);
        self.pause.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_roundtrip() {
        let signal = RenderSignal::new();
        assert!(!signal.is_aborted());
        signal.request_abort();
        assert!(signal.is_aborted());

        signal.request_pause();
        assert!(signal.is_paused());
        signal.resume();
        assert!(!signal.is_paused());

        signal.reset();
        assert!(!signal.is_aborted());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = RenderSignal::new();
        let observer = signal.clone();
        signal.request_abort();
        assert!(observer.is_aborted());
    }
}
