//! Out-of-band cancellation.
//!
//! The escape key may be observed by a system-wide key hook running on a
//! different thread than the pointer event loop. Such a source holds an
//! `EscapeSignal` and raises it; the selection machine absorbs the signal
//! at the start of its next entry point, on `poll_cancellation`, or on
//! `teardown`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Thread-safe handle that requests cancellation of the current session.
///
/// Raising only sets a flag. The host must call
/// `SelectionMachine::poll_cancellation` from its event loop so the
/// cancellation is reported even when no pointer event follows.
#[derive(Debug, Clone, Default)]
pub struct EscapeSignal {
    raised: Arc<AtomicBool>,
}

impl EscapeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Raising twice before it is absorbed is one request.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Clear the flag and report whether it was set.
    pub(crate) fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }
}

/// A platform capability that delivers cancellation requests.
///
/// Hosts implement this over whatever key-observation mechanism their
/// platform offers. The machine never cares which one fired.
pub trait CancellationSource {
    /// Start forwarding cancellation requests into `signal`.
    fn attach(&mut self, signal: EscapeSignal);

    /// Stop forwarding. Must be safe to call when not attached.
    fn detach(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_the_flag() {
        let signal = EscapeSignal::new();
        assert!(!signal.take());
        signal.raise();
        signal.raise();
        assert!(signal.is_raised());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn clones_share_state_across_threads() {
        let signal = EscapeSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.raise()).join().unwrap();
        assert!(signal.take());
    }
}
