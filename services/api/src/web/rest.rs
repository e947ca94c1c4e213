//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use report_dashboard_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

pub const MISSING_KEY_ERROR: &str = "Missing OpenAI API key";
pub const UPSTREAM_FAILURE_ERROR: &str =
    "Unexpected error occurred while communicating with OpenAI";
const MISSING_PROMPT_MESSAGE: &str = "Prompt is required and must be a string.";
const MISSING_CONTENT_ERROR: &str = "Content is required and must be a string.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_draft_handler,
        summarize_handler,
    ),
    components(
        schemas(GenerateRequest, GenerateResponse, SummarizeRequest, MessageResponse, ErrorResponse)
    ),
    tags(
        (name = "Report Dashboard API", description = "Draft generation and AI summaries for dashboard reports.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// A generated draft, ready to be added as a report.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SummarizeRequest {
    /// The report's HTML content.
    pub content: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError<T> = (StatusCode, Json<T>);

fn message(status: StatusCode, text: impl Into<String>) -> HandlerError<MessageResponse> {
    (status, Json(MessageResponse { message: text.into() }))
}

fn error_body(status: StatusCode, text: impl Into<String>) -> HandlerError<ErrorResponse> {
    (status, Json(ErrorResponse { error: text.into() }))
}

/// Reads a non-empty string field from a JSON body that may have failed to parse.
fn string_field(payload: Result<Json<Value>, JsonRejection>, field: &str) -> Option<String> {
    let Json(body) = payload.ok()?;
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a placeholder report draft from a prompt.
///
/// Responds after a short simulated delay.
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Draft generated", body = GenerateResponse),
        (status = 400, description = "Prompt missing or not a string", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    )
)]
pub async fn generate_draft_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, HandlerError<MessageResponse>> {
    let prompt = string_field(payload, "prompt")
        .ok_or_else(|| message(StatusCode::BAD_REQUEST, MISSING_PROMPT_MESSAGE))?;

    match app_state.drafts.generate_draft(&prompt).await {
        Ok(draft) => Ok(Json(GenerateResponse {
            title: draft.title,
            content: draft.content,
        })),
        Err(PortError::InvalidInput(reason)) => Err(message(StatusCode::BAD_REQUEST, reason)),
        Err(e) => {
            error!("Failed to generate draft: {:?}", e);
            Err(message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate draft",
            ))
        }
    }
}

/// Summarize a report's HTML content with the configured chat model.
///
/// The upstream chat-completion response is returned unchanged.
#[utoipa::path(
    post,
    path = "/api/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Chat-completion response from the upstream API, passed through unchanged"),
        (status = 400, description = "Content missing or not a string", body = ErrorResponse),
        (status = 500, description = "Missing API key or unexpected failure", body = ErrorResponse),
        (status = 502, description = "The upstream API reported an error", body = ErrorResponse)
    )
)]
pub async fn summarize_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, HandlerError<ErrorResponse>> {
    let completion = app_state
        .completion
        .as_ref()
        .ok_or_else(|| error_body(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_ERROR))?;

    let content = string_field(payload, "content")
        .ok_or_else(|| error_body(StatusCode::BAD_REQUEST, MISSING_CONTENT_ERROR))?;

    match completion.complete_summary(&content).await {
        Ok(body) => Ok(Json(body)),
        Err(PortError::Upstream(reason)) => {
            warn!("Summarizer rejected the request: {}", reason);
            Err(error_body(StatusCode::BAD_GATEWAY, reason))
        }
        Err(e) => {
            error!("OpenAI error: {:?}", e);
            Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                UPSTREAM_FAILURE_ERROR,
            ))
        }
    }
}
