//! Rendering and navigation helpers behind the CLI subcommands.
//!
//! Everything here is synchronous and returns strings so the binary's `main`
//! only wires I/O.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

use std::collections::HashSet;

use timeline::{EntryTree, Rgba, StyleResolver, TimeRange, TimelineModel};
use viewport::{NavigationController, PanDirection};
use wire::StyleModel;

use crate::CliError;

// =============================================================================
// RENDERING
// =============================================================================

/// Indented outline of the tree, one entry per line.
pub fn render_tree(tree: &EntryTree) -> String {
    let mut lines = Vec::with_capacity(tree.len());
    for id in tree.flatten(&HashSet::new()) {
        let Some(entry) = tree.get(id) else { continue };
        let indent = "  ".repeat(tree.depth(id));
        let marker = if entry.has_data { "" } else { " (no data)" };
        lines.push(format!("{indent}{} #{id} [{}..{}]{marker}", entry.name(), entry.start, entry.end));
    }
    join_lines(&lines)
}

/// Rows with their states, gaps marked with `~`, followed by range events.
pub fn render_rows(model: &TimelineModel) -> String {
    let mut lines = vec![format!("origin {} length {}", model.origin_offset, model.total_length)];
    for row in &model.rows {
        lines.push(format!("{} #{} ({} states)", row.name, row.entry_id, row.states.len()));
        for state in &row.states {
            let kind = if state.is_gap { "~" } else { " " };
            lines.push(format!("  {kind} {}..{} {}", state.start, state.end, state.label));
        }
        for annotation in &row.annotations {
            lines.push(format!("  @ {} +{} {}", annotation.time, annotation.duration, annotation.label));
        }
    }
    for event in &model.range_events {
        lines.push(format!("event {} +{} {}", event.time, event.duration, event.label));
    }
    join_lines(&lines)
}

fn hex(color: Rgba) -> String {
    format!("#{:06x}/{:.2}", color.rgb, color.alpha)
}

/// Every named style of the model, fully resolved.
pub fn render_styles(styles: &StyleModel) -> String {
    let resolver = StyleResolver::new(styles);
    let lines: Vec<String> = styles
        .styles
        .keys()
        .map(|key| {
            let resolved = resolver.resolve_key(key);
            format!(
                "{key}: color {} height {:.2} border {:.1} {}",
                hex(resolved.color),
                resolved.height,
                resolved.border_width,
                hex(resolved.border_color)
            )
        })
        .collect();
    join_lines(&lines)
}

/// Newline-terminated lines; empty input gives an empty string.
fn join_lines(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

// =============================================================================
// NAVIGATION SCRIPT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOp {
    ZoomIn(i64),
    ZoomOut(i64),
    Pan(PanDirection),
    View(i64, i64),
    Select(i64, i64),
    ZoomToSelection,
    ClearSelection,
    Reset,
}

fn parse_pair(raw: &str, op: &str) -> Result<(i64, i64), CliError> {
    let invalid = || CliError::InvalidOp(op.to_owned());
    // A leading `-` is the sign of the first bound, not the separator.
    let split = raw.char_indices().skip(1).find(|&(_, c)| c == '-').map(|(i, _)| i).ok_or_else(invalid)?;
    let a = raw[..split].trim().parse().map_err(|_| invalid())?;
    let b = raw[split + 1..].trim().parse().map_err(|_| invalid())?;
    Ok((a, b))
}

/// Parse one navigation step: `zoom-in@T`, `zoom-out@T`, `pan-left`,
/// `pan-right`, `view:A-B`, `select:A-B`, `zoom-selection`, `clear`, `reset`.
///
/// # Errors
///
/// Returns [`CliError::InvalidOp`] for anything else.
pub fn parse_op(raw: &str) -> Result<NavOp, CliError> {
    let invalid = || CliError::InvalidOp(raw.to_owned());
    let pivot = |t: &str| t.trim().parse::<i64>().map_err(|_| invalid());

    if let Some(t) = raw.strip_prefix("zoom-in@") {
        return Ok(NavOp::ZoomIn(pivot(t)?));
    }
    if let Some(t) = raw.strip_prefix("zoom-out@") {
        return Ok(NavOp::ZoomOut(pivot(t)?));
    }
    if let Some(pair) = raw.strip_prefix("view:") {
        let (a, b) = parse_pair(pair, raw)?;
        return Ok(NavOp::View(a, b));
    }
    if let Some(pair) = raw.strip_prefix("select:") {
        let (a, b) = parse_pair(pair, raw)?;
        return Ok(NavOp::Select(a, b));
    }
    match raw {
        "pan-left" => Ok(NavOp::Pan(PanDirection::Left)),
        "pan-right" => Ok(NavOp::Pan(PanDirection::Right)),
        "zoom-selection" => Ok(NavOp::ZoomToSelection),
        "clear" => Ok(NavOp::ClearSelection),
        "reset" => Ok(NavOp::Reset),
        _ => Err(invalid()),
    }
}

pub fn apply_op(nav: &NavigationController, op: NavOp) {
    tracing::debug!(?op, "navigation step");
    match op {
        NavOp::ZoomIn(pivot) => nav.zoom_in(pivot),
        NavOp::ZoomOut(pivot) => nav.zoom_out(pivot),
        NavOp::Pan(direction) => nav.pan(direction),
        NavOp::View(start, end) => nav.set_view_range(start, end),
        NavOp::Select(start, end) => nav.set_selection_range(start, end),
        NavOp::ZoomToSelection => {
            nav.zoom_to_selection();
        }
        NavOp::ClearSelection => nav.clear_selection(),
        NavOp::Reset => nav.reset_view(),
    }
}

/// The absolute range navigation starts from for a trace of `total_length`.
pub fn absolute_range(origin_offset: i64, total_length: i64) -> TimeRange {
    TimeRange::with_offset(0, total_length.max(0), origin_offset)
}
