//! services/api/src/adapters/draft.rs
//!
//! Placeholder implementation of `DraftGenerationService`. It does not call a
//! model; it echoes the prompt back after a fixed delay so the front end can
//! exercise its loading states.

use async_trait::async_trait;
use report_dashboard_core::domain::Draft;
use report_dashboard_core::ports::{DraftGenerationService, PortError, PortResult};
use std::time::Duration;

const TITLE_PREFIX_CHARS: usize = 30;

#[derive(Clone, Debug)]
pub struct PlaceholderDraftAdapter {
    delay: Duration,
}

impl PlaceholderDraftAdapter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DraftGenerationService for PlaceholderDraftAdapter {
    async fn generate_draft(&self, prompt: &str) -> PortResult<Draft> {
        if prompt.is_empty() {
            return Err(PortError::InvalidInput(
                "Prompt is required and must be a string.".to_string(),
            ));
        }

        tokio::time::sleep(self.delay).await;

        let head: String = prompt.chars().take(TITLE_PREFIX_CHARS).collect();
        Ok(Draft {
            title: format!("Draft: {}...", head),
            content: format!(
                "<p>This is a generated report based on: <strong>{}</strong></p>",
                prompt
            ),
        })
    }
}
