//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - `GET /` built-in upload and chat page
//! - `GET /health`
//! - `POST /upload` and `POST /chat`
//! - `GET /uploads/*` serving stored images
//! - request tracing and CORS layers

mod chat;
mod health;
mod index;
mod upload;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::AppState;

pub use chat::{ChatRequest, ChatResponse};
pub use upload::UploadResponse;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(index::router())
        .merge(health::router())
        .merge(upload::router(state.config.max_upload_bytes))
        .merge(chat::router())
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        // Wildcard; set EXPLAINER_CORS_ORIGINS to restrict.
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
