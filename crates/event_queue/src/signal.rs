//! Cooperative stop and abort flags

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::AbortSignal;
use tracing::debug;

/// Process-wide cooperative stop flag
///
/// Starts cleared and is set at most once; later requests are no-ops. Owned by
/// no single thread: every clone observes the same flag. Workers check it at
/// each iteration boundary, the dispatcher at each dequeue boundary.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn request(&self) -> bool {
        let first = !self.flag.swap(true, Ordering::AcqRel);
        if first {
            debug!("stop signal raised");
        }
        first
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Externally-driven abort request
///
/// Cloneable handle: one clone goes to the dispatcher as its [`AbortSignal`],
/// the others to whoever may request a quit (signal handler, timer, UI).
#[derive(Debug, Clone, Default)]
pub struct AbortFlag {
    flag: Arc<AtomicBool>,
}

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl AbortSignal for AbortFlag {
    fn abort_requested(&mut self) -> bool {
        self.is_triggered()
    }
}
