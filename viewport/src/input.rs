//! Input model: modifiers, buttons, keys and the timeline gesture state machine.
//!
//! `TimelineInput` translates pointer, wheel and key events on a timeline of
//! a given pixel width into navigation mutations. Only the horizontal axis
//! matters; row picking belongs to the widget.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::CLICK_SLOP_PX;
use crate::navigation::{NavigationController, PanDirection};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    #[must_use]
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// Key name as reported by the host (`"w"`, `"Escape"`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// Wheel / trackpad scroll delta in pixels.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive = down.
    pub dy: f64,
}

/// Gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    #[default]
    Idle,
    /// Primary drag: the selection follows the pointer from `anchor_time`.
    Selecting { anchor_px: f64, anchor_time: i64 },
    /// Middle drag: the view follows the pointer.
    Panning { last_px: f64 },
}

#[derive(Debug, Clone)]
pub struct TimelineInput {
    state: InputState,
    width_px: f64,
}

impl TimelineInput {
    #[must_use]
    pub fn new(width_px: f64) -> Self {
        Self { state: InputState::Idle, width_px }
    }

    #[must_use]
    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn set_width(&mut self, width_px: f64) {
        self.width_px = width_px;
    }

    pub fn on_pointer_down(&mut self, nav: &NavigationController, x: f64, button: Button, _modifiers: Modifiers) {
        self.state = match button {
            Button::Primary => InputState::Selecting { anchor_px: x, anchor_time: self.time_at(nav, x) },
            Button::Middle => InputState::Panning { last_px: x },
            Button::Secondary => InputState::Idle,
        };
    }

    pub fn on_pointer_move(&mut self, nav: &NavigationController, x: f64, _modifiers: Modifiers) {
        match self.state {
            InputState::Idle => {}
            InputState::Selecting { anchor_px, anchor_time } => {
                if (x - anchor_px).abs() >= CLICK_SLOP_PX {
                    nav.set_selection_range(anchor_time, self.time_at(nav, x));
                }
            }
            InputState::Panning { last_px } => {
                self.drag_view(nav, x - last_px);
                self.state = InputState::Panning { last_px: x };
            }
        }
    }

    pub fn on_pointer_up(&mut self, nav: &NavigationController, x: f64, _button: Button, _modifiers: Modifiers) {
        match std::mem::take(&mut self.state) {
            InputState::Idle => {}
            InputState::Selecting { anchor_px, anchor_time } => {
                if (x - anchor_px).abs() < CLICK_SLOP_PX {
                    nav.set_selection_range(anchor_time, anchor_time);
                } else {
                    nav.set_selection_range(anchor_time, self.time_at(nav, x));
                }
            }
            InputState::Panning { last_px } => self.drag_view(nav, x - last_px),
        }
    }

    /// Ctrl+wheel zooms around the pointer; a plain wheel pans one step.
    pub fn on_wheel(&mut self, nav: &NavigationController, x: f64, delta: WheelDelta, modifiers: Modifiers) {
        let amount = if delta.dx.abs() > delta.dy.abs() { delta.dx } else { delta.dy };
        if amount.abs() < f64::EPSILON {
            return;
        }
        if modifiers.ctrl {
            nav.zoom(self.time_at(nav, x), amount < 0.0);
        } else if amount < 0.0 {
            nav.pan(PanDirection::Left);
        } else {
            nav.pan(PanDirection::Right);
        }
    }

    /// `W`/`S` zoom, `A`/`D` pan, `Escape` clears the selection.
    /// Returns whether the key was handled.
    pub fn on_key_down(&mut self, nav: &NavigationController, key: &Key, _modifiers: Modifiers) -> bool {
        match key.0.to_ascii_lowercase().as_str() {
            "w" => nav.zoom_in(zoom_pivot(nav)),
            "s" => nav.zoom_out(zoom_pivot(nav)),
            "a" => nav.pan(PanDirection::Left),
            "d" => nav.pan(PanDirection::Right),
            "escape" => {
                self.state = InputState::Idle;
                nav.clear_selection();
            }
            _ => return false,
        }
        true
    }

    fn time_at(&self, nav: &NavigationController, x: f64) -> i64 {
        nav.time_at_pixel(x, self.width_px)
    }

    /// Move the view so the time under the pointer follows it.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn drag_view(&self, nav: &NavigationController, dx_px: f64) {
        if self.width_px <= 0.0 || dx_px.abs() < f64::EPSILON {
            return;
        }
        let per_px = nav.view_range().duration() as f64 / self.width_px;
        let delta = (-dx_px * per_px).round() as i64;
        if delta != 0 {
            nav.pan_by(delta);
        }
    }
}

/// Center of the selection when there is one inside the view, else of the view.
fn zoom_pivot(nav: &NavigationController) -> i64 {
    let view = nav.view_range();
    match nav.selection_range() {
        Some(sel) if view.overlaps(&sel) || view.contains(sel.start()) => sel.start() + sel.duration() / 2,
        _ => view.start() + view.duration() / 2,
    }
}
