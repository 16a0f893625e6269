//! Per-image conversation history.
//!
//! Conversations live in a bounded LRU cache. Each one sits behind its own
//! mutex so a follow-up turn can hold it across the outbound call without
//! blocking other conversations. The cache lock itself is only held for the
//! lookup or insert.

use std::num::NonZeroUsize;
use std::sync::{Arc, MutexGuard, PoisonError};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::message::ChatMessage;

/// Ordered message history for one uploaded image.
///
/// Always starts with a system message and the assistant's explanation;
/// after that, user and assistant turns alternate.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn seeded(system_prompt: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::assistant(explanation),
            ],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The full history plus a pending user turn, ready to send upstream.
    ///
    /// The conversation itself is not modified until [`Self::commit_turn`].
    pub fn with_question(&self, question: &str) -> Vec<ChatMessage> {
        let mut request = Vec::with_capacity(self.messages.len() + 1);
        request.extend_from_slice(&self.messages);
        request.push(ChatMessage::user(question));
        request
    }

    /// Record a completed user/assistant exchange.
    pub fn commit_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(ChatMessage::user(question));
        self.messages.push(ChatMessage::assistant(answer));
    }
}

pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Bounded map from image identifier to conversation.
///
/// The map sits behind a synchronous lock that is never held across an
/// `.await`; only the per-conversation lock is.
pub struct ConversationStore {
    entries: std::sync::Mutex<LruCache<String, SharedConversation>>,
}

impl ConversationStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: std::sync::Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Start a conversation from an image explanation, replacing any existing
    /// one under the same id.
    pub fn seed(&self, image_id: &str, system_prompt: &str, explanation: &str) {
        let conversation = Arc::new(Mutex::new(Conversation::seeded(system_prompt, explanation)));
        let evicted = self.entries().push(image_id.to_owned(), conversation);

        if let Some((old_id, _)) = evicted {
            if old_id != image_id {
                debug!(image_id = %old_id, "conversation evicted");
            }
        }
    }

    /// Look up a conversation, marking it as recently used.
    pub fn get(&self, image_id: &str) -> Option<SharedConversation> {
        self.entries().get(image_id).cloned()
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.entries().contains(image_id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    // Poisoning is ignored: no LRU operation can panic halfway through.
    fn entries(&self) -> MutexGuard<'_, LruCache<String, SharedConversation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
