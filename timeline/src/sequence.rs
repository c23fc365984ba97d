//! Request tickets.
//!
//! Every asynchronous fetch is issued with a [`Ticket`] carrying a sequence
//! number that grows monotonically per [`RequestClass`]. When the response
//! arrives it is applied only if its ticket is still the newest of its class;
//! responses overtaken by a later request are dropped instead of overwriting
//! fresher data.

#[cfg(test)]
#[path = "sequence_test.rs"]
mod sequence_test;

use std::sync::atomic::{AtomicU64, Ordering};

/// Kinds of requests that supersede each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    Tree,
    Rows,
    Styles,
    Search,
}

impl RequestClass {
    const COUNT: usize = 4;

    fn slot(self) -> usize {
        match self {
            Self::Tree => 0,
            Self::Rows => 1,
            Self::Styles => 2,
            Self::Search => 3,
        }
    }
}

/// Proof that a request was issued, compared against the latest one on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub class: RequestClass,
    pub seq: u64,
}

/// Hands out [`Ticket`]s and remembers the latest per class.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: [AtomicU64; RequestClass::COUNT],
}

impl RequestSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier ticket of the same class.
    pub fn issue(&self, class: RequestClass) -> Ticket {
        let seq = self.latest[class.slot()].fetch_add(1, Ordering::AcqRel) + 1;
        Ticket { class, seq }
    }

    /// Whether `ticket` is the newest issued for its class.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest[ticket.class.slot()].load(Ordering::Acquire) == ticket.seq
    }

    /// Sequence number of the newest ticket of `class` (0 when none was issued).
    #[must_use]
    pub fn latest(&self, class: RequestClass) -> u64 {
        self.latest[class.slot()].load(Ordering::Acquire)
    }
}
