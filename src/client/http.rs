//! Trace-server HTTP client.
//!
//! Thin reqwest wrapper over the four endpoints the engine consumes. Every
//! call is a JSON `POST` of a [`Query`]; the response envelope is decoded by
//! `wire`. URL building is pure for testability.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use timeline::{AnalysisClient, ClientError, OutputKey};
use wire::{AnnotationModel, EntryModel, GenericResponse, Query, StatesModel, StyleModel};

const API_PREFIX: &str = "tsp/api";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// The endpoint families of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Tree,
    States,
    Annotations,
    Style,
}

/// Full URL of `endpoint` for `key` under `base`.
#[must_use]
pub fn endpoint_url(base: &str, key: &OutputKey, endpoint: Endpoint) -> String {
    let output_root = format!(
        "{}/{API_PREFIX}/experiments/{}/outputs",
        base.trim_end_matches('/'),
        key.experiment
    );
    match endpoint {
        Endpoint::Tree => format!("{output_root}/timeGraph/{}/tree", key.output),
        Endpoint::States => format!("{output_root}/timeGraph/{}/states", key.output),
        Endpoint::Annotations => format!("{output_root}/{}/annotations", key.output),
        Endpoint::Style => format!("{output_root}/{}/style", key.output),
    }
}

pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisClient {
    /// Build a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { http, base_url: base_url.to_owned() })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        key: &OutputKey,
        endpoint: Endpoint,
        query: &Query,
    ) -> Result<GenericResponse<T>, ClientError> {
        let url = endpoint_url(&self.base_url, key, endpoint);
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .json(query)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        parse_response(status, &body)
    }
}

/// Decode a response body, rejecting non-2xx statuses.
///
/// # Errors
///
/// Returns [`ClientError::Status`] for non-success statuses and
/// [`ClientError::Decode`] for bodies that are not a response envelope.
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<GenericResponse<T>, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Status { status, body: String::from_utf8_lossy(body).into_owned() });
    }
    Ok(wire::decode_response(body)?)
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn fetch_tree(&self, key: &OutputKey, query: &Query) -> Result<GenericResponse<EntryModel>, ClientError> {
        self.post(key, Endpoint::Tree, query).await
    }

    async fn fetch_row_states(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StatesModel>, ClientError> {
        self.post(key, Endpoint::States, query).await
    }

    async fn fetch_annotations(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<AnnotationModel>, ClientError> {
        self.post(key, Endpoint::Annotations, query).await
    }

    async fn fetch_style_model(
        &self,
        key: &OutputKey,
        query: &Query,
    ) -> Result<GenericResponse<StyleModel>, ClientError> {
        self.post(key, Endpoint::Style, query).await
    }
}
