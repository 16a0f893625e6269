//! Shared application state injected into every Axum handler.

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::inference::InferenceClient;
use crate::storage::UploadStore;

pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Where uploaded images are written.
    pub uploads: UploadStore,
    /// Outbound chat-completions client.
    pub inference: InferenceClient,
    /// Per-image follow-up history.
    pub conversations: ConversationStore,
}

impl AppState {
    /// Build the state, creating the upload directory if needed.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let uploads = UploadStore::open(&config.upload_dir)
            .await
            .with_context(|| {
                format!("failed to create upload dir {}", config.upload_dir.display())
            })?;

        let inference = InferenceClient::new(config.inference.clone())
            .context("failed to build inference HTTP client")?;

        let capacity = NonZeroUsize::new(config.max_conversations).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            config: Arc::new(config),
            uploads,
            inference,
            conversations: ConversationStore::new(capacity),
        })
    }
}
