pub mod middleware;
pub mod rest;
pub mod state;

use crate::config::ConfigError;
use crate::error::ApiError;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::log_requests;
pub use rest::{generate_draft_handler, summarize_handler, ApiDoc};
pub use state::AppState;

/// Builds the complete application router: both endpoints, CORS for the
/// configured front-end origin, request logging, and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = HeaderValue::from_str(&app_state.config.allowed_origin).map_err(|e| {
        ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let api_router = Router::new()
        .route("/api/generate", post(generate_draft_handler))
        .route("/api/summarize", post(summarize_handler))
        .layer(cors)
        .layer(axum_middleware::from_fn(log_requests))
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
