//! Shared numeric constants for the viewport crate.

// ── Zoom ────────────────────────────────────────────────────────

/// View duration multiplier for one zoom-in step.
pub const ZOOM_IN_FACTOR: f64 = 0.8;

/// View duration multiplier for one zoom-out step.
pub const ZOOM_OUT_FACTOR: f64 = 1.25;

/// Shortest view a zoom may produce, in time units.
pub const MIN_VIEW_DURATION: i64 = 2;

// ── Pan ─────────────────────────────────────────────────────────

/// Fraction of the view length moved by one pan step.
pub const PAN_STEP_RATIO: f64 = 0.1;

// ── Input ───────────────────────────────────────────────────────

/// A primary drag shorter than this, in pixels, is a click.
pub const CLICK_SLOP_PX: f64 = 3.0;
