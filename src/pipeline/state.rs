//! Shared run/stop flag for the capture callback and the worker loop.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide pipeline state: Running until a stop is requested, then
/// Stopping forever.
///
/// The Running→Stopping transition happens at most once; `request_stop`
/// reports whether the caller performed it, so teardown actions keyed on
/// the transition cannot double-fire. Readers treat the flag as a snapshot
/// per poll: the capture callback checks it before enqueueing, the worker
/// at every poll boundary.
#[derive(Debug)]
pub struct PipelineState {
    stopping: AtomicBool,
}

impl PipelineState {
    /// Creates a state in Running.
    pub fn new() -> Self {
        Self {
            stopping: AtomicBool::new(false),
        }
    }

    /// Returns true while no stop has been requested.
    pub fn is_running(&self) -> bool {
        !self.stopping.load(Ordering::SeqCst)
    }

    /// Returns true once a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Requests the Running→Stopping transition.
    ///
    /// Returns true if this call performed the transition, false if it had
    /// already happened. Safe to call any number of times from any thread.
    pub fn request_stop(&self) -> bool {
        self.stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_running() {
        let state = PipelineState::new();
        assert!(state.is_running());
        assert!(!state.is_stopping());
    }

    #[test]
    fn test_request_stop_transitions_once() {
        let state = PipelineState::new();

        assert!(state.request_stop(), "first call performs the transition");
        assert!(!state.is_running());
        assert!(state.is_stopping());

        assert!(!state.request_stop(), "second call is a no-op");
        assert!(state.is_stopping());
    }

    #[test]
    fn test_concurrent_stop_requests_fire_exactly_once() {
        let state = Arc::new(PipelineState::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                thread::spawn(move || state.request_stop())
            })
            .collect();

        let transitions = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&performed| performed)
            .count();

        assert_eq!(transitions, 1, "exactly one thread wins the transition");
        assert!(state.is_stopping());
    }
}
