//! services/api/src/adapters/http_client.rs
//!
//! Client side of the two endpoints. The dashboard front end uses it as its
//! `SummarizationService` and `DraftGenerationService`, so the store talks to
//! the service the same way a browser would.

use async_trait::async_trait;
use report_dashboard_core::domain::Draft;
use report_dashboard_core::ports::{
    DraftGenerationService, PortError, PortResult, SummarizationService,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::adapters::summarizer_llm::summary_from_completion;

#[derive(Clone, Debug)]
pub struct DashboardApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    async fn post_json(&self, path: &str, body: Value) -> PortResult<(StatusCode, Value)> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Request to {} failed: {}", path, e)))?;
        let status = response.status();
        let data = response
            .json::<Value>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid response from {}: {}", path, e)))?;
        Ok((status, data))
    }
}

/// The error message carried by a response body, if any.
fn error_message(data: &Value, field: &str) -> Option<String> {
    match data.get(field)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl SummarizationService for DashboardApiClient {
    async fn summarize(&self, content: &str) -> PortResult<String> {
        let (status, data) = self
            .post_json("/api/summarize", json!({ "content": content }))
            .await?;

        if let Some(message) = error_message(&data, "error") {
            return Err(PortError::Upstream(message));
        }
        if !status.is_success() {
            return Err(PortError::Upstream("Failed to summarize content".to_string()));
        }
        Ok(summary_from_completion(&data))
    }
}

#[async_trait]
impl DraftGenerationService for DashboardApiClient {
    async fn generate_draft(&self, prompt: &str) -> PortResult<Draft> {
        let (status, data) = self
            .post_json("/api/generate", json!({ "prompt": prompt }))
            .await?;

        if !status.is_success() {
            let message = error_message(&data, "message")
                .or_else(|| error_message(&data, "error"))
                .unwrap_or_else(|| format!("Draft generation failed with status {}", status));
            return Err(if status == StatusCode::BAD_REQUEST {
                PortError::InvalidInput(message)
            } else {
                PortError::Upstream(message)
            });
        }

        // Blank fields are left for the store to replace with its fallbacks.
        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(Draft {
            title: field("title"),
            content: field("content"),
        })
    }
}
