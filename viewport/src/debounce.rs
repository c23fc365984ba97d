//! Trailing-edge fetch debouncer.
//!
//! DESIGN
//! ======
//! Continuous drags and wheel scrolls move the view many times per second.
//! The first request after a quiet period fetches immediately; requests that
//! follow within `interval` are folded into one deferred fetch that fires on
//! the first `poll_at` after the interval has elapsed.
//!
//! Every method takes the current `Instant` explicitly so tests can drive
//! time without sleeping.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceDecision {
    /// Fetch now.
    FetchNow,
    /// Too soon; the request is kept and fires on a later poll.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct FetchDebouncer {
    interval: Duration,
    last_fetch: Option<Instant>,
    pending: bool,
}

impl FetchDebouncer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_fetch: None, pending: false }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Record a fetch request made at `now`.
    pub fn request_at(&mut self, now: Instant) -> DebounceDecision {
        if self.is_quiet_at(now) {
            self.last_fetch = Some(now);
            self.pending = false;
            DebounceDecision::FetchNow
        } else {
            self.pending = true;
            DebounceDecision::Deferred
        }
    }

    /// Whether a deferred request should fire at `now`.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        if !self.pending || !self.is_quiet_at(now) {
            return false;
        }
        self.last_fetch = Some(now);
        self.pending = false;
        true
    }

    /// When the pending request becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        self.last_fetch.map(|last| last + self.interval)
    }

    fn is_quiet_at(&self, now: Instant) -> bool {
        self.last_fetch.is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }
}
