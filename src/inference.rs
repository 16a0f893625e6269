//! Client for the external chat-completions API.
//!
//! One request per call, no retries. Failures come back as [`InferenceError`]
//! and are turned into JSON error responses at the HTTP edge.

use std::time::{Duration, Instant};

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InferenceConfig;
use crate::message::ChatMessage;

/// Answer used when the API replies without `choices[0].message.content`.
pub const NO_RESPONSE: &str = "No response";

/// Longest slice of an error body kept in logs and error messages.
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("inference API returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

pub struct InferenceClient {
    http: reqwest::Client,
    config: InferenceConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Ask the model to explain an image using the configured prompt.
    pub async fn explain_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, InferenceError> {
        let message = ChatMessage::user_with_image(
            self.config.explain_prompt.as_str(),
            data_uri(image, mime_type),
        );
        debug!(bytes = image.len(), mime_type, "explaining image");
        self.complete(std::slice::from_ref(&message)).await
    }

    /// Send `messages` as-is and return the assistant's answer.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let payload = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = truncate(&body, MAX_ERROR_BODY).to_owned();
            warn!(%status, body = %body, "inference API error");
            return Err(InferenceError::Status { status, body });
        }

        let result: serde_json::Value = serde_json::from_str(&body)?;
        let answer = extract_answer(&result);

        info!(
            model = %self.config.model,
            turns = messages.len(),
            answer_chars = answer.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "inference response received"
        );

        Ok(answer)
    }
}

/// Encode raw bytes as a `data:` URI.
pub fn data_uri(bytes: &[u8], mime_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

fn extract_answer(result: &serde_json::Value) -> String {
    result["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or(NO_RESPONSE)
        .to_owned()
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
