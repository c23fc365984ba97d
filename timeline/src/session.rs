//! Output session: one data provider, one tree, one style model.
//!
//! DESIGN
//! ======
//! An output is anything that can produce a tree of entries, per-entry data for
//! a window, and styles for what it returns. Those three operations form the
//! [`OutputCapability`] trait; [`OutputSession`] owns everything stateful on
//! top of it (tree polling, the origin, style caching and stale-response
//! suppression) so a new kind of output only has to implement the trait.
//!
//! State lives behind `std::sync::Mutex` and no lock is held across an
//! `.await`, so several refreshes may be in flight at once. Only the newest
//! one (by [`RequestSequencer`] ticket) is applied.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use wire::{ElementStyle, EntryModel, GenericResponse, Query, ResponseStatus, StyleModel};

use crate::client::{AnalysisClient, OutputKey};
use crate::config::TimelineConfig;
use crate::entry::{Entry, EntryId, EntryTree};
use crate::sequence::{RequestClass, RequestSequencer, Ticket};
use crate::shaper::{DataRequest, FetchWindow, RawData, RowShaper, TimelineModel};
use crate::style::{ResolvedStyle, StyleResolver};

// =============================================================================
// CAPABILITY
// =============================================================================

/// What an output must provide. Errors are degraded inside implementations:
/// a failed tree fetch is a `Failed` envelope, failed data is `None` rows.
#[async_trait]
pub trait OutputCapability: Send + Sync {
    async fn fetch_tree(&self) -> GenericResponse<EntryModel>;

    async fn fetch_data(&self, ids: &[EntryId], request: &DataRequest) -> RawData;

    async fn fetch_styles(&self) -> Option<StyleModel>;

    /// Resolve the drawable style of a state or entry.
    fn compute_style(&self, styles: &StyleModel, style: Option<&ElementStyle>) -> ResolvedStyle {
        style.map_or_else(ResolvedStyle::default, |s| StyleResolver::new(styles).resolve(s))
    }
}

/// Capability backed by an [`AnalysisClient`].
pub struct ServerOutput {
    client: Arc<dyn AnalysisClient>,
    key: OutputKey,
}

impl ServerOutput {
    #[must_use]
    pub fn new(client: Arc<dyn AnalysisClient>, key: OutputKey) -> Self {
        Self { client, key }
    }

    #[must_use]
    pub fn key(&self) -> &OutputKey {
        &self.key
    }
}

#[async_trait]
impl OutputCapability for ServerOutput {
    async fn fetch_tree(&self) -> GenericResponse<EntryModel> {
        match self.client.fetch_tree(&self.key, &Query::default()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(output = %self.key.output, error = %e, "tree fetch failed");
                GenericResponse::empty(ResponseStatus::Failed, &e.to_string())
            }
        }
    }

    async fn fetch_data(&self, ids: &[EntryId], request: &DataRequest) -> RawData {
        let query = request.query(ids);

        let rows = match self.client.fetch_row_states(&self.key, &query).await {
            Ok(response) if response.is_usable() => response.into_usable().map(|m| m.rows),
            Ok(response) => {
                tracing::warn!(output = %self.key.output, status = ?response.status, "row states unavailable");
                None
            }
            Err(e) => {
                tracing::warn!(output = %self.key.output, error = %e, "row states fetch failed");
                None
            }
        };

        let annotations = match self.client.fetch_annotations(&self.key, &query).await {
            Ok(response) => response
                .into_usable()
                .map(|m| m.annotations.into_values().flatten().collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(output = %self.key.output, error = %e, "annotations fetch failed");
                Vec::new()
            }
        };

        RawData { rows, annotations }
    }

    async fn fetch_styles(&self) -> Option<StyleModel> {
        match self.client.fetch_style_model(&self.key, &Query::default()).await {
            Ok(response) => response.into_usable(),
            Err(e) => {
                tracing::warn!(output = %self.key.output, error = %e, "style model fetch failed");
                None
            }
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Result of [`OutputSession::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The response was the newest one and has been shaped.
    Applied(TimelineModel),
    /// A later refresh was issued before this one returned.
    Superseded(Ticket),
}

impl FetchOutcome {
    #[must_use]
    pub fn into_model(self) -> Option<TimelineModel> {
        match self {
            Self::Applied(model) => Some(model),
            Self::Superseded(_) => None,
        }
    }
}

pub struct OutputSession<C> {
    capability: C,
    config: TimelineConfig,
    sequencer: RequestSequencer,
    tree: Mutex<Arc<EntryTree>>,
    shaper: Mutex<RowShaper>,
    styles: Mutex<Option<Arc<StyleModel>>>,
}

impl<C: OutputCapability> OutputSession<C> {
    #[must_use]
    pub fn new(capability: C, config: TimelineConfig) -> Self {
        Self {
            capability,
            config,
            sequencer: RequestSequencer::new(),
            tree: Mutex::new(Arc::new(EntryTree::default())),
            shaper: Mutex::new(RowShaper::new(config)),
            styles: Mutex::new(None),
        }
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    /// Whether a non-empty tree has been loaded.
    pub fn is_ready(&self) -> bool {
        !self.tree().is_empty()
    }

    /// The current tree (empty until [`Self::fetch_tree`] succeeds).
    pub fn tree(&self) -> Arc<EntryTree> {
        Arc::clone(&self.tree.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn origin_offset(&self) -> i64 {
        self.shaper.lock().unwrap_or_else(PoisonError::into_inner).origin_offset()
    }

    pub fn total_length(&self) -> i64 {
        self.shaper.lock().unwrap_or_else(PoisonError::into_inner).total_length()
    }

    /// Load the tree, polling while the analysis is still running.
    ///
    /// Partial trees reported while running are published as they arrive.
    /// Returns the tree held by the session afterwards, which stays empty when
    /// the analysis failed.
    pub async fn fetch_tree(&self) -> Arc<EntryTree> {
        let ticket = self.sequencer.issue(RequestClass::Tree);
        for attempt in 1..=self.config.tree_max_polls {
            let response = self.capability.fetch_tree().await;
            if !self.sequencer.is_current(ticket) {
                tracing::debug!(seq = ticket.seq, "tree fetch superseded");
                return self.tree();
            }
            match response.status {
                ResponseStatus::Completed => {
                    if let Some(model) = response.model {
                        self.install_tree(model);
                    }
                    tracing::info!(entries = self.tree().len(), attempt, "tree loaded");
                    return self.tree();
                }
                ResponseStatus::Running => {
                    if let Some(model) = response.model {
                        self.install_tree(model);
                    }
                    if attempt < self.config.tree_max_polls {
                        tracing::debug!(attempt, "analysis running; polling tree again");
                        tokio::time::sleep(self.config.tree_poll_interval).await;
                    }
                }
                ResponseStatus::Failed | ResponseStatus::Cancelled => {
                    tracing::warn!(
                        status = ?response.status,
                        message = %response.status_message,
                        "tree unavailable"
                    );
                    return self.tree();
                }
            }
        }
        tracing::warn!(polls = self.config.tree_max_polls, "analysis still running; giving up on tree");
        self.tree()
    }

    fn install_tree(&self, model: EntryModel) {
        let tree = EntryTree::build(model.entries.into_iter().map(Entry::from).collect());
        self.shaper.lock().unwrap_or_else(PoisonError::into_inner).observe(&tree);
        *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(tree);
    }

    /// The output's style model, fetched once and cached. `force` refetches.
    /// A failed fetch yields an empty model and leaves the cache untouched.
    pub async fn style_model(&self, force: bool) -> Arc<StyleModel> {
        if !force {
            if let Some(cached) = self.styles.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
                return Arc::clone(cached);
            }
        }
        let ticket = self.sequencer.issue(RequestClass::Styles);
        let Some(model) = self.capability.fetch_styles().await else {
            return Arc::new(StyleModel::default());
        };
        let model = Arc::new(model);
        if self.sequencer.is_current(ticket) {
            *self.styles.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        }
        model
    }

    /// Resolve a style against the cached style model.
    pub async fn resolve_style(&self, style: Option<&ElementStyle>) -> ResolvedStyle {
        let styles = self.style_model(false).await;
        self.capability.compute_style(&styles, style)
    }

    /// The fetch `refresh` would issue for `window`.
    pub fn plan(&self, window: Option<&FetchWindow>) -> DataRequest {
        self.shaper.lock().unwrap_or_else(PoisonError::into_inner).request(window)
    }

    /// Fetch and shape rows for `ids` over `window` (whole range when `None`).
    pub async fn refresh(&self, ids: &[EntryId], window: Option<FetchWindow>) -> FetchOutcome {
        let ticket = self.sequencer.issue(RequestClass::Rows);
        let tree = self.tree();

        let data = if ids.is_empty() || tree.is_empty() {
            RawData::default()
        } else {
            let request = self.plan(window.as_ref());
            tracing::debug!(
                seq = ticket.seq,
                ids = ids.len(),
                start = request.start,
                end = request.end,
                nb_times = request.nb_times,
                "fetching rows"
            );
            self.capability.fetch_data(ids, &request).await
        };

        if !self.sequencer.is_current(ticket) {
            let latest = self.sequencer.latest(RequestClass::Rows);
            tracing::debug!(seq = ticket.seq, latest, "dropping stale rows");
            return FetchOutcome::Superseded(ticket);
        }
        let model = self.shaper.lock().unwrap_or_else(PoisonError::into_inner).shape_rows(ids, &tree, data);
        FetchOutcome::Applied(model)
    }
}
