//! "In progress" indicators that return to idle on every exit path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts overlapping operations. Raised while at least one guard is alive.
#[derive(Clone, Debug, Default)]
pub struct ActivityFlag(Arc<AtomicUsize>);

impl ActivityFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) -> ActivityGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        ActivityGuard(self.0.clone())
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

#[must_use = "the flag drops back as soon as the guard is dropped"]
pub struct ActivityGuard(Arc<AtomicUsize>);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Admits one holder at a time.
#[derive(Clone, Debug, Default)]
pub struct ExclusiveGate(Arc<AtomicBool>);

impl ExclusiveGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when someone already holds the gate.
    pub fn try_enter(&self) -> Option<GatePass> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GatePass(self.0.clone()))
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[must_use = "the gate reopens as soon as the pass is dropped"]
pub struct GatePass(Arc<AtomicBool>);

impl Drop for GatePass {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
