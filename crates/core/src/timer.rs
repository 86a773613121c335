//! Deferred timer - a cancellable, tick-driven delay
//!
//! The timer never runs callbacks itself. Its owner advances it with elapsed
//! time and acts on the returned [`TimerPoll`]. Whatever path ends the delay
//! (expiry, an interrupting tap, an explicit cancel) must first win
//! [`DeferredTimer::claim`]; the shared `resolved` flag makes that succeed at
//! most once per timer.
//!
//! A [`TimerHandle`] can be cloned out and used to request cancellation from
//! another context. The request is observed on the owner's next `advance`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct TimerFlags {
    cancel_requested: AtomicBool,
    resolved: AtomicBool,
}

/// Outcome of advancing a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPoll {
    Pending,
    Expired,
    CancelRequested,
}

#[derive(Debug)]
pub struct DeferredTimer {
    duration_ms: u32,
    elapsed_ms: u32,
    flags: Arc<TimerFlags>,
}

impl DeferredTimer {
    pub fn start(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            elapsed_ms: 0,
            flags: Arc::new(TimerFlags::default()),
        }
    }

    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            flags: Arc::clone(&self.flags),
        }
    }

    /// Add elapsed time and report where the timer stands
    pub fn advance(&mut self, elapsed_ms: u32) -> TimerPoll {
        if self.flags.cancel_requested.load(Ordering::Acquire) {
            return TimerPoll::CancelRequested;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        if self.elapsed_ms >= self.duration_ms {
            TimerPoll::Expired
        } else {
            TimerPoll::Pending
        }
    }

    pub fn remaining_ms(&self) -> u32 {
        self.duration_ms.saturating_sub(self.elapsed_ms)
    }

    /// Take the right to run the resolution. True exactly once.
    pub fn claim(&self) -> bool {
        !self.flags.resolved.swap(true, Ordering::AcqRel)
    }

    /// Drop the timer without resolving it; later claims fail
    pub fn abandon(self) {
        self.flags.resolved.store(true, Ordering::Release);
    }
}

/// Cloneable remote control for a [`DeferredTimer`]
#[derive(Debug, Clone)]
pub struct TimerHandle {
    flags: Arc<TimerFlags>,
}

impl TimerHandle {
    /// Ask the owner to resolve early. Has no effect once resolved.
    pub fn cancel(&self) {
        self.flags.cancel_requested.store(true, Ordering::Release);
    }

    pub fn is_resolved(&self) -> bool {
        self.flags.resolved.load(Ordering::Acquire)
    }
}
