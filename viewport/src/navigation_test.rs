use super::*;
use crate::bus::SignalKind;
use std::cell::RefCell;
use std::rc::Rc;

fn controller(abs: i64) -> NavigationController {
    NavigationController::new(SignalBus::new(), TimeRange::new(0, abs))
}

fn bounds(range: TimeRange) -> (i64, i64) {
    (range.start(), range.end())
}

// =============================================================
// View
// =============================================================

#[test]
fn new_controller_views_everything() {
    let nav = controller(1_000);
    assert_eq!(bounds(nav.view_range()), (0, 1_000));
    assert_eq!(nav.selection_range(), None);
}

#[test]
fn set_view_swaps_without_clamping() {
    let nav = controller(1_000);
    nav.set_view_range(5_000, -20);
    assert_eq!(bounds(nav.view_range()), (-20, 5_000));
}

#[test]
fn view_keeps_absolute_offset() {
    let nav = NavigationController::new(SignalBus::new(), TimeRange::with_offset(0, 100, 7_000));
    nav.set_view_range(10, 20);
    assert_eq!(nav.view_range().absolute_start(), 7_010);
}

#[test]
fn set_absolute_range_pulls_view_inside() {
    let nav = controller(1_000);
    nav.set_view_range(800, 1_000);
    nav.set_absolute_range(TimeRange::new(0, 900));
    assert_eq!(bounds(nav.view_range()), (800, 900));

    nav.set_absolute_range(TimeRange::new(0, 500));
    assert_eq!(bounds(nav.view_range()), (0, 500));
}

#[test]
fn reset_view_shows_absolute() {
    let nav = controller(1_000);
    nav.set_view_range(100, 200);
    nav.reset_view();
    assert_eq!(bounds(nav.view_range()), (0, 1_000));
}

// =============================================================
// Zoom
// =============================================================

#[test]
fn zoom_in_around_pivot() {
    let nav = controller(1_000);
    nav.zoom(500, true);
    // duration 800, start = 500 - round(500 * 0.8) = 100
    assert_eq!(bounds(nav.view_range()), (100, 900));
}

#[test]
fn zoom_in_then_out_restores_duration() {
    for pivot in [0, 137, 500, 999] {
        let nav = controller(100_000);
        nav.set_view_range(10_000, 20_000);
        let before = nav.view_range().duration();
        let pivot = 10_000 + pivot * 10;
        nav.zoom(pivot, true);
        nav.zoom(pivot, false);
        let after = nav.view_range().duration();
        assert!((after - before).abs() <= 1, "pivot {pivot}: {before} -> {after}");
    }
}

#[test]
fn zoom_out_clamped_to_absolute() {
    let nav = controller(1_000);
    nav.set_view_range(600, 1_000);
    nav.zoom(900, false);
    let view = nav.view_range();
    assert_eq!(view.duration(), 500);
    assert!(view.end() <= 1_000);
    assert!(view.start() >= 0);

    nav.reset_view();
    nav.zoom(500, false);
    assert_eq!(bounds(nav.view_range()), (0, 1_000));
}

#[test]
fn zoom_in_never_below_minimum_duration() {
    let nav = controller(1_000);
    nav.set_view_range(10, 12);
    nav.zoom(11, true);
    assert_eq!(nav.view_range().duration(), MIN_VIEW_DURATION);
}

#[test]
fn zoom_noop_on_empty_view() {
    let nav = controller(1_000);
    nav.set_view_range(50, 50);
    let published = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&published);
    let _sub = nav.bus().subscribe(&[SignalKind::ViewRange], move |_| *seen.borrow_mut() += 1);
    nav.zoom(50, true);
    assert_eq!(bounds(nav.view_range()), (50, 50));
    assert_eq!(*published.borrow(), 0);
}

// =============================================================
// Pan
// =============================================================

#[test]
fn pan_shifts_by_a_tenth() {
    let nav = controller(1_000);
    nav.set_view_range(400, 600);
    nav.pan(PanDirection::Right);
    assert_eq!(bounds(nav.view_range()), (420, 620));
    nav.pan(PanDirection::Left);
    assert_eq!(bounds(nav.view_range()), (400, 600));
}

#[test]
fn repeated_pan_stays_inside_absolute() {
    let nav = controller(1_000);
    nav.set_view_range(300, 550);
    for _ in 0..50 {
        nav.pan(PanDirection::Left);
        assert!(nav.view_range().start() >= 0);
    }
    assert_eq!(bounds(nav.view_range()), (0, 250));
    for _ in 0..50 {
        nav.pan(PanDirection::Right);
        assert!(nav.view_range().end() <= 1_000);
    }
    assert_eq!(bounds(nav.view_range()), (750, 1_000));
}

#[test]
fn pan_by_snaps_at_edges() {
    let nav = controller(1_000);
    nav.set_view_range(100, 300);
    nav.pan_by(-500);
    assert_eq!(bounds(nav.view_range()), (0, 200));
    nav.pan_by(5_000);
    assert_eq!(bounds(nav.view_range()), (800, 1_000));
}

// =============================================================
// Selection
// =============================================================

#[test]
fn point_selection_round_trips() {
    let nav = controller(1_000);
    nav.set_selection_range(42, 42);
    let selection = nav.selection_range().unwrap();
    assert_eq!(bounds(selection), (42, 42));
    assert!(selection.is_point());
}

#[test]
fn selection_not_clamped() {
    let nav = controller(1_000);
    nav.set_selection_range(1_500, -5);
    assert_eq!(bounds(nav.selection_range().unwrap()), (-5, 1_500));
    nav.clear_selection();
    assert_eq!(nav.selection_range(), None);
}

#[test]
fn zoom_to_selection_clamps_into_absolute() {
    let nav = controller(1_000);
    assert!(!nav.zoom_to_selection());

    nav.set_selection_range(900, 1_200);
    assert!(nav.zoom_to_selection());
    assert_eq!(bounds(nav.view_range()), (900, 1_000));

    nav.set_selection_range(10, 10);
    assert!(!nav.zoom_to_selection());
}

#[test]
fn mutators_publish_before_returning() {
    let nav = Rc::new(controller(1_000));
    let observed = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&observed);
    let reader = Rc::clone(&nav);
    let _sub = nav.bus().subscribe(&[SignalKind::ViewRange, SignalKind::SelectionRange], move |signal| {
        // The controller already holds the new value when observers run.
        let state = reader.state();
        match signal {
            Signal::ViewRangeChanged(view) => assert_eq!(*view, state.view_range),
            Signal::SelectionRangeChanged(sel) => assert_eq!(*sel, state.selection_range),
            _ => {}
        }
        log.borrow_mut().push(signal.kind());
    });

    nav.set_view_range(10, 20);
    nav.set_selection_range(12, 15);
    nav.clear_selection();
    assert_eq!(*observed.borrow(), vec![SignalKind::ViewRange, SignalKind::SelectionRange, SignalKind::SelectionRange]);
}

// =============================================================
// Coordinates
// =============================================================

#[test]
fn pixel_time_mapping() {
    let nav = controller(10_000);
    nav.set_view_range(1_000, 3_000);
    assert_eq!(nav.time_at_pixel(0.0, 1_000.0), 1_000);
    assert_eq!(nav.time_at_pixel(500.0, 1_000.0), 2_000);
    assert_eq!(nav.time_at_pixel(5_000.0, 1_000.0), 3_000);
    assert!((nav.pixel_of_time(2_500, 1_000.0) - 750.0).abs() < 1e-9);
    assert_eq!(nav.clamp_time(-3), 0);
    assert_eq!(nav.clamp_time(20_000), 10_000);
}

#[test]
fn state_serializes_with_null_selection() {
    let nav = NavigationController::new(SignalBus::new(), TimeRange::with_offset(0, 100, 5));
    let json = serde_json::to_value(nav.state()).unwrap();
    assert_eq!(json["view_range"], serde_json::json!({"start": 0, "end": 100, "offset": 5}));
    assert!(json["selection_range"].is_null());
}
