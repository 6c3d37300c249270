//! Cooperative cancellation for batch runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A settable, resettable, readable cancellation flag shared between a
/// running batch and an out-of-band control surface.
///
/// The flag defaults to `false`. The scheduler resets it when a run starts,
/// so a stale `true` left behind by a previously aborted run cannot abort
/// the next one. One token serializes one active run at a time: starting a
/// second run on the same token resets the flag under the first run's feet,
/// so callers must not share a token between concurrent batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the active run.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so a new run can start.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Poll the flag.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
