//! The release token: "consensus is ready for the next proposal".

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-bit permission shared by every caller of the release protocol.
///
/// `true` means a commit arrived and no proposal has consumed it yet.
/// Consumption is a compare-and-swap, so of any number of concurrent
/// attempts exactly one observes `true`.
#[derive(Debug)]
pub struct ReleaseGate {
    unlocked: AtomicBool,
}

impl ReleaseGate {
    pub fn new(unlocked: bool) -> Self {
        Self {
            unlocked: AtomicBool::new(unlocked),
        }
    }

    /// Atomically test-and-clear. Returns whether the caller now owns the
    /// token.
    pub fn try_acquire(&self) -> bool {
        self.unlocked
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Set the token. Also used to hand back an acquired token that had
    /// nothing to release.
    pub fn unlock(&self) {
        self.unlocked.store(true, Ordering::SeqCst);
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }
}
