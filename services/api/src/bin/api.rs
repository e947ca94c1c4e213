//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        draft::PlaceholderDraftAdapter,
        summarizer_llm::{single_attempt_client, OpenAiSummarizerAdapter},
    },
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::config::OpenAIConfig;
use report_dashboard_core::ports::ChatCompletionService;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let completion: Option<Arc<dyn ChatCompletionService>> = match config.openai_api_key.as_ref() {
        Some(api_key) => {
            let openai_client = single_attempt_client(OpenAIConfig::new().with_api_key(api_key));
            let adapter: Arc<dyn ChatCompletionService> = Arc::new(OpenAiSummarizerAdapter::new(
                openai_client,
                config.summary_model.clone(),
                config.summary_temperature,
            ));
            Some(adapter)
        }
        None => {
            warn!("OPENAI_API_KEY is not set; /api/summarize will report a missing key");
            None
        }
    };
    let drafts = Arc::new(PlaceholderDraftAdapter::new(config.draft_delay));

    // --- 3. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        completion,
        drafts,
    });
    let app = build_router(app_state)?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
