//! External cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag the caller raises to abort the current request.
///
/// Cheap to clone; every clone observes the same flag. The controller checks
/// it before each attempt. Once raised it stays raised until [`reset`].
///
/// [`reset`]: CancelSignal::reset
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let signal = CancelSignal::new();
        let remote = signal.clone();
        assert!(!signal.is_cancelled());

        remote.cancel();
        assert!(signal.is_cancelled());

        signal.reset();
        assert!(!remote.is_cancelled());
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let signal = CancelSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(signal.is_cancelled());
    }
}
