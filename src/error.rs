//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`. Errors become a JSON body
//! of the form `{"error": "..."}` with a matching status code. Storage
//! failures are logged in full but only a generic message is sent
//! back, so file paths never reach the client.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::inference::InferenceError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or incomplete request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured upload limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// The caller referenced a conversation that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The external inference call failed.
    #[error(transparent)]
    Upstream(#[from] InferenceError),

    /// Writing an upload to disk failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge("Uploaded file is too large".into())
        } else {
            ServerError::BadRequest(e.body_text())
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Upstream(e) => {
                error!(error = %e, "inference call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ServerError::Storage(e) => {
                error!(error = %e, "upload storage failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
