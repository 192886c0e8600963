//! HTTP client for the answer-generation service.

use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RagRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RagResponse {
    answer: Option<String>,
}

/// Everything that can go wrong during a dispatch. The controller converts
/// all of these uniformly into the fallback message; the distinction only
/// matters for the log.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("request to answer service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("answer service returned status {0}")]
    Status(StatusCode),
    #[error("answer service response has no answer field")]
    MissingAnswer,
}

/// Client for the `/rag` endpoint of the Academ.ia backend.
///
/// One request per call, no retry. The caller is responsible for validating
/// that the query is non-empty before dispatching.
#[derive(Clone)]
pub struct RagClient {
    client: reqwest::Client,
    base_url: String,
}

impl RagClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one query and return the service's answer verbatim.
    pub async fn send(&self, query: &str) -> Result<String, DispatchError> {
        let url = format!("{}/rag", self.base_url);
        tracing::debug!(%url, "dispatching query");

        let response = self
            .client
            .post(&url)
            .json(&RagRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        let body: RagResponse = response.json().await?;
        body.answer.ok_or(DispatchError::MissingAnswer)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
