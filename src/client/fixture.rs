//! Offline `AnalysisClient` serving a recorded output from a JSON file.
//!
//! The document holds one completed model per endpoint. Row and annotation
//! queries are answered the way a server would: only the requested items,
//! only what intersects the requested time range.

#[cfg(test)]
#[path = "fixture_test.rs"]
mod fixture_test;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use timeline::{AnalysisClient, ClientError, OutputKey};
use wire::{AnnotationModel, EntryModel, GenericResponse, Query, RawRow, StatesModel, StyleModel};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub tree: EntryModel,
    #[serde(default)]
    pub states: StatesModel,
    #[serde(default)]
    pub annotations: AnnotationModel,
    #[serde(default)]
    pub styles: StyleModel,
}

pub struct FixtureClient {
    document: FixtureDocument,
}

impl FixtureClient {
    #[must_use]
    pub fn new(document: FixtureDocument) -> Self {
        Self { document }
    }

    /// Parse a fixture document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `text` is not a fixture document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Load a fixture document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Transport(format!("{}: {e}", path.display())))?;
        let client = Self::from_json(&text).map_err(|e| ClientError::Transport(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), entries = client.document.tree.entries.len(), "fixture loaded");
        Ok(client)
    }
}

/// The `[start, end]` window of a query, if it names one.
fn window(query: &Query) -> Option<(i64, i64)> {
    query.parameters.requested_timerange.map(|r| (r.start.min(r.end), r.start.max(r.end)))
}

fn wants(query: &Query, id: i64) -> bool {
    let items = &query.parameters.requested_items;
    items.is_empty() || items.contains(&id)
}

fn clip_row(row: &RawRow, window: Option<(i64, i64)>) -> RawRow {
    let states = row
        .states
        .iter()
        .filter(|s| window.is_none_or(|(start, end)| s.end >= start && s.start <= end))
        .cloned()
        .collect();
    RawRow { entry_id: row.entry_id, states }
}

#[async_trait]
impl AnalysisClient for FixtureClient {
    async fn fetch_tree(&self, _key: &OutputKey, _query: &Query) -> Result<GenericResponse<EntryModel>, ClientError> {
        Ok(GenericResponse::completed(self.document.tree.clone()))
    }

    async fn fetch_row_states(
        &self,
        _key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StatesModel>, ClientError> {
        let window = window(query);
        let rows = self
            .document
            .states
            .rows
            .iter()
            .filter(|row| wants(query, row.entry_id))
            .map(|row| clip_row(row, window))
            .collect();
        Ok(GenericResponse::completed(StatesModel { rows }))
    }

    async fn fetch_annotations(
        &self,
        _key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<AnnotationModel>, ClientError> {
        let window = window(query);
        let annotations = self
            .document
            .annotations
            .annotations
            .iter()
            .map(|(category, list)| {
                let kept = list
                    .iter()
                    .filter(|a| window.is_none_or(|(start, end)| a.time + a.duration >= start && a.time <= end))
                    .cloned()
                    .collect();
                (category.clone(), kept)
            })
            .collect();
        Ok(GenericResponse::completed(AnnotationModel { annotations }))
    }

    async fn fetch_style_model(
        &self,
        _key: &OutputKey,
        _query: &Query,
    ) -> Result<GenericResponse<StyleModel>, ClientError> {
        Ok(GenericResponse::completed(self.document.styles.clone()))
    }
}
