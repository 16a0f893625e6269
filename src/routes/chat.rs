//! `POST /chat`: a follow-up question against an uploaded image.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::state::AppState;

/// Both fields are optional at the type level so that a missing one is
/// reported as our own 400 instead of a deserialization rejection.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub image_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Replays the whole conversation plus the new question upstream. The
/// exchange is only recorded once the answer arrives.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    let Json(req) = payload?;

    let (image_id, message) = match (non_blank(req.image_id), non_blank(req.message)) {
        (Some(image_id), Some(message)) => (image_id, message),
        _ => {
            return Err(ServerError::BadRequest(
                "Missing image_id or message".into(),
            ))
        }
    };

    let handle = state
        .conversations
        .get(&image_id)
        .ok_or_else(|| ServerError::NotFound("Conversation not found".into()))?;

    // Held across the upstream call so turns on one image never interleave.
    let mut conversation = handle.lock().await;
    let request = conversation.with_question(&message);
    debug!(image_id = %image_id, turns = request.len(), "sending follow-up");

    let answer = state.inference.complete(&request).await?;
    conversation.commit_turn(message, answer.as_str());

    info!(image_id = %image_id, messages = conversation.len(), "follow-up answered");

    Ok(Json(ChatResponse { response: answer }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
