//! `POST /upload`: store an image, get it explained, seed its conversation.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    pub explanation: String,
}

pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new().route(
        "/upload",
        post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let start = Instant::now();

    let image = read_image_field(&mut multipart).await?;
    let stored = state.uploads.save(&image).await?;
    info!(
        image_id = %stored.image_id,
        bytes = image.len(),
        mime_type = stored.kind.mime_type,
        "image uploaded"
    );

    let explanation = state
        .inference
        .explain_image(&image, stored.kind.mime_type)
        .await?;

    state
        .conversations
        .seed(&stored.image_id, &state.config.system_prompt, &explanation);

    info!(
        image_id = %stored.image_id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "explanation ready"
    );

    Ok(Json(UploadResponse {
        image_id: stored.image_id,
        explanation,
    }))
}

/// Pull the bytes of the `image` field, skipping any other fields.
async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, ServerError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        match field.file_name() {
            Some(name) if !name.is_empty() => {}
            _ => return Err(ServerError::BadRequest("No selected file".into())),
        }
        return Ok(field.bytes().await?);
    }
    Err(ServerError::BadRequest("No file uploaded".into()))
}
