//! services/api/src/adapters/summarizer_llm.rs
//!
//! This module contains the adapter for the summarizing LLM.
//! It implements both the raw `ChatCompletionService` port used by the
//! `/api/summarize` endpoint and the `SummarizationService` port used by the
//! report store.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use report_dashboard_core::ports::{
    ChatCompletionService, PortError, PortResult, SummarizationService,
};
use serde_json::Value;
use std::time::Duration;

const SYSTEM_INSTRUCTIONS: &str =
    "You are an assistant that summarizes HTML content clearly and concisely.";

/// Shown when the model answers without any text.
pub const NO_SUMMARY: &str = "No summary available.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that summarizes report HTML using an OpenAI-compatible chat model.
#[derive(Clone)]
pub struct OpenAiSummarizerAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiSummarizerAdapter {
    /// Creates a new `OpenAiSummarizerAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

/// Builds a client that sends each request exactly once.
///
/// The stock client retries rate limits and server errors with exponential
/// backoff; a summary is one round trip, so any failure is returned at once.
pub fn single_attempt_client(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config).with_backoff(no_retry)
}

/// Maps client errors so that errors reported by the API keep their message.
fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::ApiError(api) => PortError::Upstream(api.message),
        other => PortError::Unexpected(other.to_string()),
    }
}

/// Pulls the first choice's text out of a chat-completion response body.
pub fn summary_from_completion(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_SUMMARY)
        .to_string()
}

//=========================================================================================
// Trait Implementations
//=========================================================================================

#[async_trait]
impl ChatCompletionService for OpenAiSummarizerAdapter {
    async fn complete_summary(&self, content: &str) -> PortResult<Value> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Summarize this HTML content:\n\n{}", content))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Decoded as raw JSON so the body reaches the caller exactly as sent.
        let response: Value = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(map_openai_error)?;

        Ok(response)
    }
}

#[async_trait]
impl SummarizationService for OpenAiSummarizerAdapter {
    async fn summarize(&self, content: &str) -> PortResult<String> {
        let body = self.complete_summary(content).await?;
        Ok(summary_from_completion(&body))
    }
}
