use super::*;
use timeline::{Entry, FetchOutcome};
use viewport::SignalBus;
use wire::ElementStyle;

fn tree() -> EntryTree {
    let mut root = Entry::new(1, None, "kernel");
    root.start = 0;
    root.end = 500;
    let mut child = Entry::new(2, Some(1), "swapper");
    child.end = 500;
    child.has_data = false;
    EntryTree::build(vec![root, child])
}

#[test]
fn tree_is_indented_by_depth() {
    let text = render_tree(&tree());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["kernel #1 [0..500]", "  swapper #2 [0..500] (no data)"]);
}

#[test]
fn empty_model_renders_header_only() {
    let text = render_rows(&TimelineModel::default());
    assert_eq!(text, "origin 0 length 0\n");
}

#[test]
fn styles_are_resolved() {
    let mut styles = StyleModel::default();
    styles.styles.insert("base".into(), ElementStyle::default().with("background-color", "#102030"));
    styles.styles.insert("run".into(), ElementStyle::inherit("base").with("height", 0.5));
    let text = render_styles(&styles);
    assert!(text.contains("run: color #102030/1.00 height 0.50"), "{text}");
}

#[test]
fn parses_every_op() {
    assert_eq!(parse_op("zoom-in@500").unwrap(), NavOp::ZoomIn(500));
    assert_eq!(parse_op("zoom-out@0").unwrap(), NavOp::ZoomOut(0));
    assert_eq!(parse_op("pan-left").unwrap(), NavOp::Pan(PanDirection::Left));
    assert_eq!(parse_op("pan-right").unwrap(), NavOp::Pan(PanDirection::Right));
    assert_eq!(parse_op("view:10-20").unwrap(), NavOp::View(10, 20));
    assert_eq!(parse_op("select:30-5").unwrap(), NavOp::Select(30, 5));
    assert_eq!(parse_op("zoom-selection").unwrap(), NavOp::ZoomToSelection);
    assert_eq!(parse_op("clear").unwrap(), NavOp::ClearSelection);
    assert_eq!(parse_op("reset").unwrap(), NavOp::Reset);
}

#[test]
fn negative_bounds_parse() {
    assert_eq!(parse_op("view:-5-10").unwrap(), NavOp::View(-5, 10));
    assert_eq!(parse_op("select:-20--3").unwrap(), NavOp::Select(-20, -3));
    assert_eq!(parse_op("zoom-in@-7").unwrap(), NavOp::ZoomIn(-7));
}

#[test]
fn rejects_unknown_ops() {
    for raw in ["zoom-in@", "zoom-in@x", "select:5", "view:a-b", "jump"] {
        assert!(matches!(parse_op(raw), Err(CliError::InvalidOp(_))), "{raw}");
    }
}

#[test]
fn script_drives_controller() {
    let nav = NavigationController::new(SignalBus::new(), absolute_range(1_000, 10_000));
    for raw in ["zoom-in@5000", "pan-right", "select:2000-3000", "zoom-selection"] {
        apply_op(&nav, parse_op(raw).unwrap());
    }
    let state = nav.state();
    assert_eq!(state.view_range.start(), 2_000);
    assert_eq!(state.view_range.end(), 3_000);
    assert_eq!(state.view_range.absolute_start(), 3_000);

    apply_op(&nav, NavOp::Reset);
    assert_eq!(nav.view_range().duration(), 10_000);
}

#[test]
fn superseded_outcome_has_no_model() {
    let outcome = FetchOutcome::Superseded(timeline::Ticket { class: timeline::RequestClass::Rows, seq: 2 });
    assert!(outcome.into_model().is_none());
}
