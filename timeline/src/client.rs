//! Analysis-server capability consumed by output sessions.
//!
//! Implementations live outside this crate (HTTP, fixtures, test mocks). The
//! trait mirrors the three data endpoints plus the tree endpoint; every call
//! returns the server's [`GenericResponse`] envelope so callers can tell a
//! still-running analysis apart from a failed one.

use async_trait::async_trait;
use wire::{AnnotationModel, EntryModel, GenericResponse, Query, StatesModel, StyleModel};

/// Error raised by [`AnalysisClient`] implementations.
///
/// The engine never propagates these to widgets: a failed call degrades to an
/// empty result and is logged.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body did not decode.
    #[error("response decode failed: {0}")]
    Decode(#[from] wire::WireError),
    /// The server answered with a non-success HTTP status.
    #[error("server returned status {status}")]
    Status { status: u16, body: String },
}

/// Identifies one output of one trace (or experiment) on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputKey {
    pub experiment: String,
    pub output: String,
}

impl OutputKey {
    #[must_use]
    pub fn new(experiment: &str, output: &str) -> Self {
        Self { experiment: experiment.to_owned(), output: output.to_owned() }
    }
}

/// Provider-neutral async access to a trace-analysis server. Enables mocking in tests.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Fetch the entry tree of an output.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request or decoding fails.
    async fn fetch_tree(&self, key: &OutputKey, query: &Query) -> Result<GenericResponse<EntryModel>, ClientError>;

    /// Fetch per-entry states for the requested items and times.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request or decoding fails.
    async fn fetch_row_states(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StatesModel>, ClientError>;

    /// Fetch annotations grouped by category.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request or decoding fails.
    async fn fetch_annotations(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<AnnotationModel>, ClientError>;

    /// Fetch the output's style model.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request or decoding fails.
    async fn fetch_style_model(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StyleModel>, ClientError>;
}
