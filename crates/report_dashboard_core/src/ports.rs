//! crates/report_dashboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) the dashboard core depends on.
//! Storage, the summarizer, and the draft generator sit behind these traits so
//! the store never knows whether it talks to a file, memory, or the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Draft, Severity};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., disk, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The remote API answered with an error payload.
    #[error("{0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string key-value store with browser local-storage semantics.
///
/// Calls are synchronous and each `set_item` replaces the whole value.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> PortResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove_item(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Summarizes a report's HTML content. One call is one round trip.
    async fn summarize(&self, content: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Asks the chat model to summarize `content` and returns its response body untouched.
    async fn complete_summary(&self, content: &str) -> PortResult<Value>;
}

#[async_trait]
pub trait DraftGenerationService: Send + Sync {
    /// Produces a title/content pair from a free-form prompt.
    async fn generate_draft(&self, prompt: &str) -> PortResult<Draft>;
}

/// Surfaces short, non-blocking messages to whoever drives the store.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}
