//! Typed publish/subscribe bus shared by the widgets of one trace context.
//!
//! DESIGN
//! ======
//! The bus is a plain value constructed by its owner and cloned into every
//! component that needs it; there is no process-wide instance. Clones share
//! one subscriber list.
//!
//! Delivery is synchronous: `publish` returns after every interested handler
//! ran. Handlers may publish in turn. A handler that is already running when
//! a nested publish reaches it is skipped for that nested signal, which is
//! what stops two widgets from bouncing the same change back and forth.
//!
//! Subscriptions unsubscribe when dropped, so a widget's subscriptions live
//! exactly as long as the widget.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::Serialize;
use timeline::TimeRange;

/// Rows picked in a table-like widget, with the time span they cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowSelection {
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: i64,
    pub end_time: i64,
}

/// A value broadcast to every subscriber of its [`SignalKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Signal {
    ViewRangeChanged(TimeRange),
    SelectionRangeChanged(Option<TimeRange>),
    RowSelectionChanged(RowSelection),
    ItemPropertiesChanged(BTreeMap<String, String>),
    AbsoluteRangeChanged(TimeRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    ViewRange,
    SelectionRange,
    RowSelection,
    ItemProperties,
    AbsoluteRange,
}

impl Signal {
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::ViewRangeChanged(_) => SignalKind::ViewRange,
            Self::SelectionRangeChanged(_) => SignalKind::SelectionRange,
            Self::RowSelectionChanged(_) => SignalKind::RowSelection,
            Self::ItemPropertiesChanged(_) => SignalKind::ItemProperties,
            Self::AbsoluteRangeChanged(_) => SignalKind::AbsoluteRange,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&Signal)>>;

struct Slot {
    id: u64,
    kinds: Vec<SignalKind>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: Vec<Slot>,
}

#[derive(Clone, Default)]
pub struct SignalBus {
    registry: Rc<RefCell<Registry>>,
}

impl SignalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the given kinds. Keep the returned
    /// [`Subscription`] alive for as long as the handler should run.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, kinds: &[SignalKind], handler: F) -> Subscription
    where
        F: FnMut(&Signal) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.slots.push(Slot { id, kinds: kinds.to_vec(), handler: Rc::new(RefCell::new(handler)) });
        Subscription { id, registry: Rc::downgrade(&self.registry) }
    }

    /// Deliver `signal` to every interested handler. Returns how many ran.
    pub fn publish(&self, signal: &Signal) -> usize {
        let kind = signal.kind();
        let targets: Vec<(u64, Handler)> = self
            .registry
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.kinds.contains(&kind))
            .map(|slot| (slot.id, Rc::clone(&slot.handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in targets {
            if let Ok(mut run) = handler.try_borrow_mut() {
                (*run)(signal);
                delivered += 1;
            } else {
                tracing::debug!(subscriber = id, ?kind, "handler already running; nested signal skipped");
            }
        }
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().slots.len()
    }
}

/// Live registration on a [`SignalBus`]; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().slots.retain(|slot| slot.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
