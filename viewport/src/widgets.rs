//! Headless widget participants.
//!
//! DESIGN
//! ======
//! Each widget keeps its own state behind `Rc<RefCell<..>>`, shared with the
//! bus handlers it registers at construction. Handlers only update that
//! state; anything that writes to the controller or publishes happens in the
//! widget's own methods, after its state borrow is released, so a synchronous
//! echo can always borrow the state again.
//!
//! - [`TimelineWidget`] follows the view and turns view changes into
//!   debounced fetch windows.
//! - [`EventTableWidget`] turns row clicks into selections and follows
//!   selections made elsewhere.
//! - [`PropertiesPanel`] shows the last item properties published.

#[cfg(test)]
#[path = "widgets_test.rs"]
mod widgets_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use timeline::{FetchOutcome, FetchWindow, TimeRange, TimelineModel};
use uuid::Uuid;

use crate::bus::{RowSelection, Signal, SignalKind, Subscription};
use crate::context::TraceContext;
use crate::debounce::{DebounceDecision, FetchDebouncer};
use crate::guard::EchoGuard;

// =============================================================================
// TIMELINE
// =============================================================================

struct TimelineState {
    view: TimeRange,
    selection: Option<TimeRange>,
    width_px: u32,
    dirty: bool,
    debouncer: FetchDebouncer,
    pending: Option<FetchWindow>,
    model: Option<TimelineModel>,
}

pub struct TimelineWidget {
    id: Uuid,
    state: Rc<RefCell<TimelineState>>,
    _subscriptions: Vec<Subscription>,
}

impl TimelineWidget {
    #[must_use]
    pub fn new(ctx: &TraceContext, width_px: u32, debounce: Duration) -> Self {
        let id = Uuid::new_v4();
        let state = Rc::new(RefCell::new(TimelineState {
            view: ctx.navigation().view_range(),
            selection: ctx.navigation().selection_range(),
            width_px,
            dirty: true,
            debouncer: FetchDebouncer::new(debounce),
            pending: None,
            model: None,
        }));

        let follow = Rc::clone(&state);
        let kinds = [SignalKind::ViewRange, SignalKind::SelectionRange, SignalKind::AbsoluteRange];
        let subscription = ctx.bus().subscribe(&kinds, move |signal| {
            let mut s = follow.borrow_mut();
            match signal {
                Signal::ViewRangeChanged(view) => {
                    s.view = *view;
                    s.dirty = true;
                }
                Signal::SelectionRangeChanged(selection) => s.selection = *selection,
                Signal::AbsoluteRangeChanged(_) => {
                    s.model = None;
                    s.dirty = true;
                }
                _ => {}
            }
        });

        Self { id, state, _subscriptions: vec![subscription] }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn view(&self) -> TimeRange {
        self.state.borrow().view
    }

    #[must_use]
    pub fn selection(&self) -> Option<TimeRange> {
        self.state.borrow().selection
    }

    pub fn set_width(&self, width_px: u32) {
        let mut s = self.state.borrow_mut();
        s.width_px = width_px;
        s.dirty = true;
    }

    /// The window waiting for the debounce interval, if any.
    #[must_use]
    pub fn pending_window(&self) -> Option<FetchWindow> {
        self.state.borrow().pending
    }

    /// The window to fetch at `now`, if a fetch is due.
    pub fn poll_fetch(&self, now: Instant) -> Option<FetchWindow> {
        let mut s = self.state.borrow_mut();
        if s.dirty {
            s.dirty = false;
            let window = FetchWindow::for_width(s.view, s.width_px);
            return match s.debouncer.request_at(now) {
                DebounceDecision::FetchNow => {
                    s.pending = None;
                    Some(window)
                }
                DebounceDecision::Deferred => {
                    s.pending = Some(window);
                    None
                }
            };
        }
        if s.debouncer.poll_at(now) {
            return s.pending.take();
        }
        None
    }

    /// Apply a refresh result. Superseded results are dropped.
    pub fn apply(&self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Applied(model) => {
                tracing::debug!(widget = %self.id, rows = model.rows.len(), "timeline model applied");
                self.state.borrow_mut().model = Some(model);
                true
            }
            FetchOutcome::Superseded(ticket) => {
                tracing::debug!(widget = %self.id, seq = ticket.seq, "superseded model ignored");
                false
            }
        }
    }

    #[must_use]
    pub fn model(&self) -> Option<TimelineModel> {
        self.state.borrow().model.clone()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.state.borrow().model.as_ref().map_or(0, |m| m.rows.len())
    }
}

// =============================================================================
// EVENT TABLE
// =============================================================================

/// One line of the event table, at an origin-relative time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub timestamp: i64,
    pub properties: BTreeMap<String, String>,
}

impl TableRow {
    #[must_use]
    pub fn new(timestamp: i64, properties: &[(&str, &str)]) -> Self {
        let properties = properties.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Self { timestamp, properties }
    }
}

struct TableState {
    rows: Vec<TableRow>,
    highlighted: Option<usize>,
    echoes_skipped: usize,
}

pub struct EventTableWidget {
    id: Uuid,
    state: Rc<RefCell<TableState>>,
    guard: Rc<EchoGuard>,
    _subscriptions: Vec<Subscription>,
}

impl EventTableWidget {
    /// A table over `rows`, kept sorted by timestamp.
    #[must_use]
    pub fn new(ctx: &TraceContext, mut rows: Vec<TableRow>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        let state = Rc::new(RefCell::new(TableState { rows, highlighted: None, echoes_skipped: 0 }));
        let guard = Rc::new(EchoGuard::new());

        let follow = Rc::clone(&state);
        let echo = Rc::clone(&guard);
        let subscription = ctx.bus().subscribe(&[SignalKind::SelectionRange], move |signal| {
            let Signal::SelectionRangeChanged(selection) = signal else {
                return;
            };
            let mut s = follow.borrow_mut();
            if echo.consume_echo() {
                s.echoes_skipped += 1;
                return;
            }
            let highlighted = selection.and_then(|range| nearest_row(&s.rows, range.start()));
            s.highlighted = highlighted;
        });

        Self { id: Uuid::new_v4(), state, guard, _subscriptions: vec![subscription] }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<usize> {
        self.state.borrow().highlighted
    }

    /// How many of this widget's own selection writes came back as echoes.
    #[must_use]
    pub fn echoes_skipped(&self) -> usize {
        self.state.borrow().echoes_skipped
    }

    /// Click on one row: a cursor at its timestamp. Returns `false` for an
    /// index outside the table.
    pub fn click_row(&self, ctx: &TraceContext, index: usize) -> bool {
        self.select_rows(ctx, index, index)
    }

    /// Select rows `first..=last` (either order): the selection spans their
    /// timestamps.
    pub fn select_rows(&self, ctx: &TraceContext, first: usize, last: usize) -> bool {
        let (first, last) = if last < first { (last, first) } else { (first, last) };
        let picked = {
            let mut s = self.state.borrow_mut();
            match (s.rows.get(first), s.rows.get(last)) {
                (Some(a), Some(b)) => {
                    let picked = (a.timestamp, b.timestamp, b.properties.clone());
                    s.highlighted = Some(last);
                    Some(picked)
                }
                _ => None,
            }
        };
        let Some((start_time, end_time, properties)) = picked else {
            return false;
        };

        tracing::debug!(widget = %self.id, first, last, start_time, end_time, "table selection");
        self.guard.arm();
        ctx.navigation().set_selection_range(start_time, end_time);
        if self.guard.is_armed() {
            // Our handler did not run (nested delivery); nothing to consume.
            self.guard.disarm();
        }

        let bus = ctx.bus();
        bus.publish(&Signal::RowSelectionChanged(RowSelection {
            start_index: first,
            end_index: last,
            start_time,
            end_time,
        }));
        bus.publish(&Signal::ItemPropertiesChanged(properties));
        true
    }
}

/// First row at or after `t`, else the last row.
fn nearest_row(rows: &[TableRow], t: i64) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    let index = rows.partition_point(|r| r.timestamp < t);
    Some(index.min(rows.len() - 1))
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[derive(Default)]
struct PanelState {
    properties: BTreeMap<String, String>,
    updates: usize,
}

pub struct PropertiesPanel {
    state: Rc<RefCell<PanelState>>,
    _subscriptions: Vec<Subscription>,
}

impl PropertiesPanel {
    #[must_use]
    pub fn new(ctx: &TraceContext) -> Self {
        let state = Rc::new(RefCell::new(PanelState::default()));
        let follow = Rc::clone(&state);
        let subscription = ctx.bus().subscribe(&[SignalKind::ItemProperties], move |signal| {
            if let Signal::ItemPropertiesChanged(properties) = signal {
                let mut s = follow.borrow_mut();
                s.properties.clone_from(properties);
                s.updates += 1;
            }
        });
        Self { state, _subscriptions: vec![subscription] }
    }

    #[must_use]
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.state.borrow().properties.clone()
    }

    #[must_use]
    pub fn updates(&self) -> usize {
        self.state.borrow().updates
    }
}
