//! One-shot echo guard.
//!
//! A widget that writes to the shared controller arms its guard first; the
//! write publishes synchronously and the widget's own handler consumes the
//! guard on that first delivery instead of reacting to its own change.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct EchoGuard {
    armed: Cell<bool>,
}

impl EchoGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the next observed event as this widget's own echo.
    pub fn arm(&self) {
        self.armed.set(true);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Whether the event being handled is the echo; always disarms.
    pub fn consume_echo(&self) -> bool {
        self.armed.replace(false)
    }

    /// Disarm without consuming, for writes that published nothing.
    pub fn disarm(&self) {
        self.armed.set(false);
    }
}
