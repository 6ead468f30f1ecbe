/// Debounced edge latch: the hand-off between a button's edge notifier
/// and the main loop.
///
/// Single producer, single consumer. The notifier only ever *sets* the
/// pending flag (after its own debounce guard); the main loop only ever
/// reads-and-clears it with one atomic swap. Nothing else crosses
/// contexts, so no lock is needed.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::hw::elapsed;

pub struct ButtonLatch {
    pending: AtomicBool,
    last_edge: AtomicU32,
}

impl ButtonLatch {
    pub const fn new() -> Self {
        ButtonLatch {
            pending: AtomicBool::new(false),
            last_edge: AtomicU32::new(0),
        }
    }

    /// Edge notification. Accepted only if more than `window_ms` has
    /// passed since the previous accepted edge. Returns whether it was.
    pub fn notify(&self, now: u32, window_ms: u32) -> bool {
        let last = self.last_edge.load(Ordering::Relaxed);
        if elapsed(now, last) <= window_ms {
            return false;
        }
        self.last_edge.store(now, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Consume a pending press.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        ButtonLatch::new()
    }
}
