//! Trace context: the bus and the navigation controller of one open trace.
//!
//! Widgets receive the bus at construction and reach the controller through
//! the context, so when the user switches traces every widget sees the new
//! controller without holding a stale one.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::rc::Rc;

use timeline::TimeRange;

use crate::bus::{Signal, SignalBus};
use crate::navigation::NavigationController;

pub struct TraceContext {
    bus: SignalBus,
    trace_id: Option<String>,
    controller: Rc<NavigationController>,
}

impl TraceContext {
    /// A context with no trace open (empty absolute range).
    #[must_use]
    pub fn new(bus: SignalBus) -> Self {
        let controller = Rc::new(NavigationController::new(bus.clone(), TimeRange::default()));
        Self { bus, trace_id: None, controller }
    }

    #[must_use]
    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// The controller shared by every widget of this context.
    #[must_use]
    pub fn navigation(&self) -> &NavigationController {
        &self.controller
    }

    #[must_use]
    pub fn controller(&self) -> Rc<NavigationController> {
        Rc::clone(&self.controller)
    }

    /// Replace the controller for a newly opened trace and announce its
    /// ranges. The old controller stays valid for anyone still holding it but
    /// no longer drives the widgets.
    pub fn switch_trace(&mut self, trace_id: &str, absolute: TimeRange) {
        tracing::info!(trace = trace_id, %absolute, "switching trace");
        self.trace_id = Some(trace_id.to_owned());
        self.controller = Rc::new(NavigationController::new(self.bus.clone(), absolute));
        self.bus.publish(&Signal::AbsoluteRangeChanged(absolute));
        self.bus.publish(&Signal::ViewRangeChanged(absolute));
        self.bus.publish(&Signal::SelectionRangeChanged(None));
    }
}
