//! Server configuration, loaded from environment variables at startup.
//!
//! `main` reads a `.env` file first (via `dotenvy`), so every variable below
//! can live there as well.

use std::path::PathBuf;

use anyhow::{bail, Result};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const DEFAULT_EXPLAIN_PROMPT: &str = "Can you explain what the professor is teaching? \
     Provide a detailed explanation related to the topic.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a patient tutor. You have just explained \
     an image of lecture material to a student. Answer their follow-up questions about it \
     clearly and accurately.";

/// Settings for the outbound chat-completions call.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Full URL of the chat-completions endpoint.
    pub api_url: String,
    /// Sent as `Authorization: Bearer <api_key>`.
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound for a single outbound request, in seconds.
    pub timeout_secs: u64,
    /// Instruction sent alongside every uploaded image.
    pub explain_prompt: String,
}

/// Runtime configuration for the server.
///
/// Everything except the API key has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:5000"`).
    pub bind_address: String,

    /// Where uploaded images are written (default: `uploads`).
    pub upload_dir: PathBuf,

    /// Body limit applied to `POST /upload`.
    pub max_upload_bytes: usize,

    /// Capacity of the conversation cache. Least recently used entries are
    /// evicted beyond this.
    pub max_conversations: usize,

    /// Comma-separated CORS allow-list. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// First message of every conversation.
    pub system_prompt: String,

    pub inference: InferenceConfig,
}

impl Config {
    /// Build [`Config`] from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup("OPENAI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!("missing OpenAI API key: set OPENAI_API_KEY in the environment or .env file"),
        };

        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Ok(Self {
            bind_address: env_or("EXPLAINER_BIND", "0.0.0.0:5000"),
            upload_dir: PathBuf::from(env_or("EXPLAINER_UPLOAD_DIR", "uploads")),
            max_upload_bytes: parse_or(&lookup, "EXPLAINER_MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            max_conversations: parse_or(&lookup, "EXPLAINER_MAX_CONVERSATIONS", 1024_usize).max(1),
            cors_allowed_origins: lookup("EXPLAINER_CORS_ORIGINS").filter(|s| !s.trim().is_empty()),
            log_level: env_or("EXPLAINER_LOG", "info"),
            log_json: lookup("EXPLAINER_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            system_prompt: env_or("EXPLAINER_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            inference: InferenceConfig {
                api_url: env_or("EXPLAINER_API_URL", DEFAULT_API_URL),
                api_key,
                model: env_or("EXPLAINER_MODEL", DEFAULT_MODEL),
                max_tokens: parse_or(&lookup, "EXPLAINER_MAX_TOKENS", 500),
                temperature: parse_or(&lookup, "EXPLAINER_TEMPERATURE", 0.7),
                timeout_secs: parse_or(&lookup, "EXPLAINER_TIMEOUT_SECS", 300),
                explain_prompt: env_or("EXPLAINER_PROMPT", DEFAULT_EXPLAIN_PROMPT),
            },
        })
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
