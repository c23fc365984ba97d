//! Row data shaper.
//!
//! DESIGN
//! ======
//! The server answers a data query with one list of absolute-time states per
//! entry it knows about, in no guaranteed order and with holes between
//! states. Widgets want the opposite: one row per requested id, in the
//! requested order, with states relative to a shared origin and every hole
//! filled so a bar can be drawn edge to edge.
//!
//! Shaping is split in two:
//!
//! 1. [`RowShaper::request`] turns the visible window into the padded range
//!    and sample count to fetch (prefetching around the view so small pans
//!    need no refetch).
//! 2. [`RowShaper::shape_rows`] is pure: it takes what came back (or `None`
//!    when the fetch failed) and builds the [`TimelineModel`].
//!
//! The shaper keeps two values across calls: the origin offset, fixed the
//! first time a non-empty tree is seen, and the total length, which only grows.

#[cfg(test)]
#[path = "shaper_test.rs"]
mod shaper_test;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use wire::{AnnotationKind, ElementStyle, Query, QueryParameters, RawAnnotation, RawRow, RawState};

use crate::config::TimelineConfig;
use crate::entry::{Entry, EntryId, EntryTree};
use crate::style::default_gap_style;
use crate::time_range::TimeRange;

/// States further apart than this get a gap state between them.
const GAP_THRESHOLD: i64 = 1;

/// Entry id of annotations that span the whole chart.
const CHART_WIDE: EntryId = -1;

// =============================================================================
// MODEL
// =============================================================================

/// One drawable interval of a row, in origin-relative time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub start: i64,
    pub end: i64,
    pub label: String,
    pub style: Option<ElementStyle>,
    /// Synthesized filler between two server states.
    pub is_gap: bool,
}

impl State {
    #[must_use]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    fn placeholder() -> Self {
        Self { start: 0, end: 0, label: String::new(), style: None, is_gap: false }
    }

    fn gap(start: i64, end: i64, style: &ElementStyle) -> Self {
        Self { start, end, label: String::new(), style: Some(style.clone()), is_gap: true }
    }
}

/// A point or short-span marker, in origin-relative time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub entry_id: EntryId,
    pub time: i64,
    pub duration: i64,
    pub label: String,
    pub style: Option<ElementStyle>,
}

impl Annotation {
    fn from_raw(raw: RawAnnotation, offset: i64) -> Self {
        Self {
            entry_id: raw.entry_id,
            time: raw.time - offset,
            duration: raw.duration,
            label: raw.label,
            style: raw.style,
        }
    }
}

/// Shaped row for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub entry_id: EntryId,
    pub name: String,
    /// Entry data range, relative to the model origin.
    pub range: TimeRange,
    pub states: Vec<State>,
    pub annotations: Vec<Annotation>,
    /// Start of the first known state, target of "previous state" navigation.
    pub prev_possible_state: i64,
    /// End of the last known state, target of "next state" navigation.
    pub next_possible_state: i64,
    /// Style carried by synthesized gaps.
    pub gap_style: ElementStyle,
}

impl Row {
    /// The state covering relative time `t`, gaps included.
    #[must_use]
    pub fn state_at(&self, t: i64) -> Option<&State> {
        self.states.iter().find(|s| s.start <= t && t < s.end)
    }
}

/// Everything a timeline widget draws for one fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineModel {
    pub rows: Vec<Row>,
    /// Chart annotations not attached to any shaped row.
    pub range_events: Vec<Annotation>,
    pub total_length: i64,
    pub origin_offset: i64,
}

impl TimelineModel {
    #[must_use]
    pub fn row(&self, id: EntryId) -> Option<&Row> {
        self.rows.iter().find(|r| r.entry_id == id)
    }
}

// =============================================================================
// FETCH PLANNING
// =============================================================================

/// The visible window a widget wants data for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchWindow {
    /// Origin-relative view range.
    pub range: TimeRange,
    /// Time units per pixel.
    pub resolution: f64,
}

impl FetchWindow {
    /// Window over `range` drawn across `width_px` pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_width(range: TimeRange, width_px: u32) -> Self {
        let resolution = range.duration() as f64 / f64::from(width_px.max(1));
        Self { range, resolution }
    }
}

/// Server payload of one data fetch, after error degradation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawData {
    /// `None` when the states fetch failed.
    pub rows: Option<Vec<RawRow>>,
    pub annotations: Vec<RawAnnotation>,
}

/// Absolute range and sample count to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRequest {
    pub start: i64,
    pub end: i64,
    pub nb_times: u64,
}

impl DataRequest {
    /// Query body selecting `ids` over this request's samples.
    #[must_use]
    pub fn query(&self, ids: &[EntryId]) -> Query {
        QueryParameters::for_window(ids, self.start, self.end, self.nb_times).into()
    }
}

// =============================================================================
// SHAPER
// =============================================================================

#[derive(Debug, Clone)]
pub struct RowShaper {
    config: TimelineConfig,
    origin_offset: Option<i64>,
    total_length: i64,
}

impl RowShaper {
    #[must_use]
    pub fn new(config: TimelineConfig) -> Self {
        Self { config, origin_offset: None, total_length: 0 }
    }

    #[must_use]
    pub fn origin_offset(&self) -> i64 {
        self.origin_offset.unwrap_or(0)
    }

    #[must_use]
    pub fn total_length(&self) -> i64 {
        self.total_length
    }

    /// Relative range covering everything seen so far.
    #[must_use]
    pub fn absolute_range(&self) -> TimeRange {
        TimeRange::with_offset(0, self.total_length, self.origin_offset())
    }

    /// Record a freshly loaded tree: fixes the origin on first sight and
    /// grows the total length to the tree's time bounds.
    pub fn observe(&mut self, tree: &EntryTree) {
        let Some(first) = tree.entries().first() else {
            return;
        };
        if self.origin_offset.is_none() {
            self.origin_offset = Some(first.start);
            tracing::debug!(origin = first.start, "origin offset fixed");
        }
        if let Some((_, end)) = tree.time_bounds() {
            self.total_length = self.total_length.max(end - self.origin_offset());
        }
    }

    /// Plan the fetch for `window`, or for the whole range when `None`.
    #[must_use]
    pub fn request(&self, window: Option<&FetchWindow>) -> DataRequest {
        let absolute = self.total_length.max(0);
        let (start, end, resolution) = match window {
            Some(w) => {
                let len = w.range.duration();
                let overlap = (len * self.config.prefetch_factor - len) / 2;
                let start = (w.range.start() - overlap).clamp(0, absolute);
                let end = (w.range.end() + overlap).clamp(0, absolute);
                (start, end, w.resolution * self.config.resolution_relax)
            }
            None => {
                #[allow(clippy::cast_precision_loss)]
                let resolution = absolute as f64 / f64::from(self.config.default_width_px.max(1));
                (0, absolute, resolution)
            }
        };
        let offset = self.origin_offset();
        DataRequest {
            start: start + offset,
            end: end + offset,
            nb_times: sample_count(end - start, resolution, self.config.max_samples),
        }
    }

    /// Build the model for `ids` out of one fetch's payload.
    ///
    /// Rows follow `ids` exactly. A failed fetch (`data.rows == None`) gives
    /// an empty model rather than an error.
    pub fn shape_rows(&mut self, ids: &[EntryId], tree: &EntryTree, data: RawData) -> TimelineModel {
        let origin_offset = self.origin_offset();
        if ids.is_empty() || tree.is_empty() {
            return self.empty_model();
        }
        let Some(raw_rows) = data.rows else {
            tracing::warn!(ids = ids.len(), "row data unavailable; returning empty rows");
            return self.empty_model();
        };

        let mut by_entry: HashMap<EntryId, RawRow> = HashMap::with_capacity(raw_rows.len());
        for raw in raw_rows {
            by_entry.entry(raw.entry_id).or_insert(raw);
        }

        let requested: HashSet<EntryId> = ids.iter().copied().collect();
        let mut annotations: HashMap<EntryId, Vec<Annotation>> = HashMap::new();
        let mut range_events = Vec::new();
        for raw in data.annotations.into_iter().filter(|a| a.kind == AnnotationKind::Chart) {
            let annotation = Annotation::from_raw(raw, origin_offset);
            if annotation.entry_id == CHART_WIDE {
                range_events.push(annotation);
            } else if requested.contains(&annotation.entry_id) {
                annotations.entry(annotation.entry_id).or_default().push(annotation);
            }
        }

        let mut rows = Vec::with_capacity(ids.len());
        for &id in ids {
            let entry = tree.get(id);
            let mut row = match by_entry.remove(&id) {
                Some(raw) => self.build_row(id, entry, raw.states),
                None => placeholder_row(id, entry, origin_offset),
            };
            row.annotations = annotations.remove(&id).unwrap_or_default();
            rows.push(row);
        }

        tracing::debug!(rows = rows.len(), range_events = range_events.len(), "rows shaped");
        TimelineModel { rows, range_events, total_length: self.total_length, origin_offset }
    }

    fn empty_model(&self) -> TimelineModel {
        TimelineModel {
            rows: Vec::new(),
            range_events: Vec::new(),
            total_length: self.total_length,
            origin_offset: self.origin_offset(),
        }
    }

    fn build_row(&mut self, id: EntryId, entry: Option<&Entry>, mut raw: Vec<RawState>) -> Row {
        let offset = self.origin_offset();
        let gap_style = entry.and_then(|e| e.style.clone()).unwrap_or_else(default_gap_style);
        raw.sort_by_key(|s| (s.start, s.end));

        let mut states: Vec<State> = Vec::with_capacity(raw.len() * 2);
        for s in raw {
            let (start, end) = if s.end < s.start { (s.end, s.start) } else { (s.start, s.end) };
            let mut start = start - offset;
            let end = end - offset;
            if let Some(prev) = states.last() {
                // Overlapping server states are clipped to keep the row ordered.
                start = start.max(prev.end);
                if end < start {
                    continue;
                }
                if start - prev.end > GAP_THRESHOLD {
                    states.push(State::gap(prev.end, start, &gap_style));
                }
            }
            self.total_length = self.total_length.max(end);
            states.push(State { start, end, label: s.label.unwrap_or_default(), style: s.style, is_gap: false });
        }

        let range = entry_range(entry, offset);
        let prev_possible_state = states.first().map_or(range.start(), |s| s.start);
        let next_possible_state = states.last().map_or(range.end(), |s| s.end);
        Row {
            entry_id: id,
            name: entry.map_or_else(String::new, |e| e.name().to_owned()),
            range,
            states,
            annotations: Vec::new(),
            prev_possible_state,
            next_possible_state,
            gap_style,
        }
    }
}

fn placeholder_row(id: EntryId, entry: Option<&Entry>, offset: i64) -> Row {
    let range = entry_range(entry, offset);
    Row {
        entry_id: id,
        name: entry.map_or_else(String::new, |e| e.name().to_owned()),
        range,
        states: vec![State::placeholder()],
        annotations: Vec::new(),
        prev_possible_state: range.start(),
        next_possible_state: range.end(),
        gap_style: entry.and_then(|e| e.style.clone()).unwrap_or_else(default_gap_style),
    }
}

fn entry_range(entry: Option<&Entry>, offset: i64) -> TimeRange {
    entry.map_or(TimeRange::with_offset(0, 0, offset), |e| TimeRange::from_absolute(e.start, e.end, offset))
}

/// `ceil(len / resolution) + 1`, kept within `[2, max]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn sample_count(len: i64, resolution: f64, max: u64) -> u64 {
    let max = max.max(2);
    if len <= 0 {
        return 2;
    }
    if !(resolution.is_finite() && resolution > 0.0) {
        return max;
    }
    let slices = (len as f64 / resolution).ceil();
    if slices >= max as f64 {
        return max;
    }
    (slices as u64 + 1).clamp(2, max)
}
