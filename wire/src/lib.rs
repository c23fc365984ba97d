//! Response shapes consumed from the trace analysis server.
//!
//! This crate owns the serde representation shared by the `timeline` engine
//! and the `tracelens` client implementations. It only models the parts of the
//! server API the engine actually reads; everything else in a payload is
//! ignored on decode.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error returned by [`decode_response`].
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The raw bytes were not a JSON document of the expected shape.
    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Completion status reported by the server alongside every model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    /// The analysis is still running; the model may be partial or absent.
    #[default]
    Running,
    /// The analysis finished and the model is final.
    Completed,
    /// The analysis failed.
    Failed,
    /// The analysis was cancelled.
    Cancelled,
}

/// Envelope wrapping every analysis-server model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericResponse<T> {
    /// The payload, absent when the server has nothing to return yet.
    pub model: Option<T>,
    /// Analysis status at the time of the response.
    #[serde(default)]
    pub status: ResponseStatus,
    /// Human-readable status detail.
    #[serde(default)]
    pub status_message: String,
}

impl<T> GenericResponse<T> {
    /// A completed response carrying `model`.
    #[must_use]
    pub fn completed(model: T) -> Self {
        Self { model: Some(model), status: ResponseStatus::Completed, status_message: String::new() }
    }

    /// A response with no model and the given status.
    #[must_use]
    pub fn empty(status: ResponseStatus, message: &str) -> Self {
        Self { model: None, status, status_message: message.to_owned() }
    }

    /// Whether the response can be used: not failed or cancelled, and a model is present.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.model.is_some() && matches!(self.status, ResponseStatus::Running | ResponseStatus::Completed)
    }

    /// Consume the envelope, keeping the model only when [`Self::is_usable`].
    #[must_use]
    pub fn into_usable(self) -> Option<T> {
        if self.is_usable() { self.model } else { None }
    }
}

// =============================================================================
// STYLES
// =============================================================================

/// A single style property value. Numbers and strings are both legal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A style attached to an element (state, annotation, entry) or stored in the
/// output's style model.
///
/// `parent_key` is a comma-separated list of style-model keys consulted when a
/// property is not set in `values`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, StyleValue>,
}

impl ElementStyle {
    /// A style with no values of its own that defers entirely to `parent_key`.
    #[must_use]
    pub fn inherit(parent_key: &str) -> Self {
        Self { parent_key: Some(parent_key.to_owned()), values: BTreeMap::new() }
    }

    /// Builder-style value insertion.
    #[must_use]
    pub fn with(mut self, property: &str, value: impl Into<StyleValue>) -> Self {
        self.values.insert(property.to_owned(), value.into());
        self
    }

    /// Parent keys in declared order, with whitespace and empty segments removed.
    pub fn parent_keys(&self) -> impl Iterator<Item = &str> {
        self.parent_key
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// The style table of one output, keyed by style name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleModel {
    #[serde(default)]
    pub styles: BTreeMap<String, ElementStyle>,
}

// =============================================================================
// ENTRIES
// =============================================================================

/// One entry of the output tree (a thread, a CPU, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub id: i64,
    /// Parent entry id; `-1` or absent for roots.
    #[serde(default = "no_parent")]
    pub parent_id: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default = "default_has_data")]
    pub has_data: bool,
}

fn no_parent() -> i64 {
    -1
}

fn default_has_data() -> bool {
    true
}

/// Tree model returned by the tree endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryModel {
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

// =============================================================================
// STATES
// =============================================================================

/// A labeled interval as reported by the server, in absolute time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    pub start: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
}

/// All states of one entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    pub entry_id: i64,
    #[serde(default)]
    pub states: Vec<RawState>,
}

/// Row model returned by the states endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatesModel {
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// Where an annotation is meant to be drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnotationKind {
    /// Drawn on the time graph.
    #[default]
    Chart,
    /// Drawn in the entry tree.
    Tree,
}

/// A point or short-span marker, in absolute time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnnotation {
    pub time: i64,
    #[serde(default)]
    pub duration: i64,
    /// Entry the marker belongs to; `-1` for markers that span the whole chart.
    #[serde(default = "no_parent")]
    pub entry_id: i64,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: AnnotationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
}

/// Annotation model returned by the annotations endpoint, keyed by category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationModel {
    #[serde(default)]
    pub annotations: BTreeMap<String, Vec<RawAnnotation>>,
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// Time window requested from the server with its sample count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedRange {
    pub start: i64,
    pub end: i64,
    pub nb_times: u64,
}

/// Body parameters for data fetches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_timerange: Option<RequestedRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_items: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_times: Vec<i64>,
}

impl QueryParameters {
    /// Parameters selecting `ids` over `count` equally spaced samples of `[start, end]`.
    #[must_use]
    pub fn for_window(ids: &[i64], start: i64, end: i64, count: u64) -> Self {
        Self {
            requested_timerange: Some(RequestedRange { start, end, nb_times: count }),
            requested_items: ids.to_vec(),
            requested_times: time_slices(start, end, count),
        }
    }
}

/// The `{"parameters": ...}` body every POST endpoint expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub parameters: QueryParameters,
}

impl From<QueryParameters> for Query {
    fn from(parameters: QueryParameters) -> Self {
        Self { parameters }
    }
}

/// Split `[start, end]` into `count` equally spaced sample times.
///
/// The first sample is always `start` and the last is always `end`. A count of
/// zero yields no samples, a count of one yields only `start`.
#[must_use]
pub fn time_slices(start: i64, end: i64, count: u64) -> Vec<i64> {
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = i128::from(end) - i128::from(start);
            let steps = i128::from(count - 1);
            (0..count)
                .map(|i| {
                    let offset = span * i128::from(i) / steps;
                    i64::try_from(i128::from(start) + offset).unwrap_or(end)
                })
                .collect()
        }
    }
}

/// Decode a JSON response envelope.
///
/// # Errors
///
/// Returns [`WireError::Decode`] when `bytes` is not valid JSON or does not
/// match the envelope shape.
pub fn decode_response<T: DeserializeOwned>(bytes: &[u8]) -> Result<GenericResponse<T>, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
