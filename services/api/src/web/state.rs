//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use report_dashboard_core::ports::{ChatCompletionService, DraftGenerationService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no API key is configured; the summarize endpoint then
    /// answers with a fixed error instead of calling out.
    pub completion: Option<Arc<dyn ChatCompletionService>>,
    pub drafts: Arc<dyn DraftGenerationService>,
}
