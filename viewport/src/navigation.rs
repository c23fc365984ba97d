//! Navigation controller: absolute, view and selection ranges.
//!
//! One controller is shared (behind `Rc`) by every widget of a trace context.
//! Mutators take `&self`, update the state in place and publish the matching
//! signal before returning, so observers always see the new value.
//!
//! All ranges are relative to the absolute range's origin offset.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::cell::Cell;

use serde::Serialize;
use timeline::TimeRange;

use crate::bus::{Signal, SignalBus};
use crate::consts::{MIN_VIEW_DURATION, PAN_STEP_RATIO, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationState {
    pub absolute_range: TimeRange,
    pub view_range: TimeRange,
    /// `None` when nothing is selected; a point range is a cursor.
    pub selection_range: Option<TimeRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
}

pub struct NavigationController {
    state: Cell<NavigationState>,
    bus: SignalBus,
}

impl NavigationController {
    /// A controller whose view spans the whole `absolute` range.
    #[must_use]
    pub fn new(bus: SignalBus, absolute: TimeRange) -> Self {
        let state = NavigationState { absolute_range: absolute, view_range: absolute, selection_range: None };
        Self { state: Cell::new(state), bus }
    }

    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state.get()
    }

    #[must_use]
    pub fn absolute_range(&self) -> TimeRange {
        self.state.get().absolute_range
    }

    #[must_use]
    pub fn view_range(&self) -> TimeRange {
        self.state.get().view_range
    }

    #[must_use]
    pub fn selection_range(&self) -> Option<TimeRange> {
        self.state.get().selection_range
    }

    #[must_use]
    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    fn absolute_len(&self) -> i64 {
        self.absolute_range().end()
    }

    fn relative(&self, start: i64, end: i64) -> TimeRange {
        TimeRange::with_offset(start, end, self.absolute_range().offset())
    }

    // --- View ---

    /// Set the view as given (bounds swapped if reversed, never clamped).
    pub fn set_view_range(&self, start: i64, end: i64) {
        let view = self.relative(start, end);
        self.state.set(NavigationState { view_range: view, ..self.state.get() });
        self.bus.publish(&Signal::ViewRangeChanged(view));
    }

    /// Replace the absolute range, pulling the view inside it.
    pub fn set_absolute_range(&self, absolute: TimeRange) {
        let state = self.state.get();
        let view = TimeRange::with_offset(state.view_range.start(), state.view_range.end(), absolute.offset());
        let view = match view.intersection(&absolute) {
            Some(inside) if inside.duration() > 0 => inside,
            _ => absolute,
        };
        self.state.set(NavigationState { absolute_range: absolute, view_range: view, ..state });
        self.bus.publish(&Signal::AbsoluteRangeChanged(absolute));
        self.bus.publish(&Signal::ViewRangeChanged(view));
    }

    /// Show the whole absolute range.
    pub fn reset_view(&self) {
        let absolute = self.absolute_range();
        self.set_view_range(absolute.start(), absolute.end());
    }

    /// Zoom around `pivot`. Does nothing when the view is shorter than one unit.
    pub fn zoom(&self, pivot: i64, zoom_in: bool) {
        let view = self.view_range();
        let current = view.duration();
        if current < 1 {
            return;
        }
        let factor = if zoom_in { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
        let absolute = self.absolute_len();
        let duration = scale(current, factor).max(MIN_VIEW_DURATION).min(absolute.max(0));
        let mut start = (pivot - scale(pivot - view.start(), factor)).max(0);
        if start + duration > absolute {
            start = (absolute - duration).max(0);
        }
        tracing::debug!(pivot, zoom_in, start, duration, "zoom");
        self.set_view_range(start, start + duration);
    }

    pub fn zoom_in(&self, pivot: i64) {
        self.zoom(pivot, true);
    }

    pub fn zoom_out(&self, pivot: i64) {
        self.zoom(pivot, false);
    }

    /// Shift the view one step, snapping against either end of the absolute range.
    pub fn pan(&self, direction: PanDirection) {
        let step = scale(self.view_range().duration(), PAN_STEP_RATIO);
        match direction {
            PanDirection::Left => self.pan_by(-step),
            PanDirection::Right => self.pan_by(step),
        }
    }

    /// Shift the view by `delta` time units, snapping against the absolute range.
    pub fn pan_by(&self, delta: i64) {
        let view = self.view_range();
        let len = view.duration();
        let absolute = self.absolute_len();
        let (start, end) = if view.start() + delta < 0 {
            (0, len)
        } else if view.end() + delta > absolute {
            ((absolute - len).max(0), absolute)
        } else {
            (view.start() + delta, view.end() + delta)
        };
        self.set_view_range(start, end);
    }

    // --- Selection ---

    /// Select `[start, end]` as given. `start == end` places a cursor.
    pub fn set_selection_range(&self, start: i64, end: i64) {
        let selection = self.relative(start, end);
        self.state.set(NavigationState { selection_range: Some(selection), ..self.state.get() });
        self.bus.publish(&Signal::SelectionRangeChanged(Some(selection)));
    }

    pub fn clear_selection(&self) {
        self.state.set(NavigationState { selection_range: None, ..self.state.get() });
        self.bus.publish(&Signal::SelectionRangeChanged(None));
    }

    /// Make the view cover the selection. Point selections and no selection
    /// leave the view unchanged; returns whether the view moved.
    pub fn zoom_to_selection(&self) -> bool {
        let Some(selection) = self.selection_range() else {
            return false;
        };
        if selection.duration() < MIN_VIEW_DURATION {
            return false;
        }
        let start = self.clamp_time(selection.start());
        let end = self.clamp_time(selection.end());
        self.set_view_range(start, end);
        true
    }

    // --- Coordinates ---

    /// Clamp a relative time into the absolute range.
    #[must_use]
    pub fn clamp_time(&self, t: i64) -> i64 {
        self.absolute_range().clamp(t)
    }

    /// Relative time under pixel `px` of a `width_px` wide view.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn time_at_pixel(&self, px: f64, width_px: f64) -> i64 {
        let view = self.view_range();
        if width_px <= 0.0 {
            return view.start();
        }
        let ratio = (px / width_px).clamp(0.0, 1.0);
        view.start() + (view.duration() as f64 * ratio).round() as i64
    }

    /// Pixel of relative time `t` in a `width_px` wide view.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pixel_of_time(&self, t: i64, width_px: f64) -> f64 {
        let view = self.view_range();
        if view.duration() == 0 {
            return 0.0;
        }
        (t - view.start()) as f64 / view.duration() as f64 * width_px
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn scale(value: i64, factor: f64) -> i64 {
    (value as f64 * factor).round() as i64
}
