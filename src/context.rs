//! Per-conversation context memory
//!
//! Bounded history of recent exchanges plus a small newest-first ring of
//! topic words, keyed by conversation id. Repeat-question detection runs
//! token-set similarity against the stored history.

use crate::analyzer;
use crate::rng::RandomSource;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Exchanges kept per conversation, oldest evicted first.
pub const MAX_HISTORY_ENTRIES: usize = 20;
/// Topic words kept per conversation, newest first.
pub const MAX_RECENT_TOPICS: usize = 5;
/// Similarity above which two messages count as the same question.
pub const REPEAT_SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryEntry {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationContext {
    #[serde(default)]
    pub message_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub recent_topics: Vec<String>,
    pub last_active: String,
}

impl ConversationContext {
    fn empty() -> Self {
        Self {
            message_history: Vec::new(),
            recent_topics: Vec::new(),
            last_active: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ContextMemory {
    #[serde(default)]
    contexts: IndexMap<String, ConversationContext>,
}

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored context for a conversation, or a fresh empty one. The fresh
    /// context is not retained until the first `append_turn`.
    pub fn get(&self, conversation_id: &str) -> ConversationContext {
        self.contexts
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(ConversationContext::empty)
    }

    /// True when any stored exchange is more than 80% similar to the
    /// incoming message.
    pub fn is_repeated_question(&self, message: &str, conversation_id: &str) -> bool {
        let Some(context) = self.contexts.get(conversation_id) else {
            return false;
        };
        let simplified = message.to_lowercase();
        let simplified = simplified.trim().to_string();

        context.message_history.iter().any(|entry| {
            analyzer::similarity(&simplified, &entry.message.to_lowercase())
                > REPEAT_SIMILARITY_THRESHOLD
        })
    }

    /// Response from the most similar past exchange above the threshold.
    /// Strict greater-than comparison means the first-scanned entry wins
    /// a similarity tie.
    pub fn previous_response_for(&self, message: &str, conversation_id: &str) -> Option<String> {
        let context = self.contexts.get(conversation_id)?;
        let simplified = message.to_lowercase();
        let simplified = simplified.trim().to_string();

        let mut best: Option<&HistoryEntry> = None;
        let mut highest = REPEAT_SIMILARITY_THRESHOLD;

        for entry in &context.message_history {
            let score = analyzer::similarity(&simplified, &entry.message.to_lowercase());
            if score > highest {
                highest = score;
                best = Some(entry);
            }
        }

        best.map(|entry| entry.response.clone())
    }

    /// Record one exchange. Evicts the oldest history entry past the cap,
    /// then samples one significant word from the message (via the injected
    /// random source) as the newest topic. Messages without significant
    /// words leave the topic list untouched.
    pub fn append_turn(
        &mut self,
        message: &str,
        response: &str,
        conversation_id: &str,
        rng: &mut dyn RandomSource,
    ) {
        let now = Utc::now().to_rfc3339();
        let context = self
            .contexts
            .entry(conversation_id.to_string())
            .or_insert_with(ConversationContext::empty);

        context.message_history.push(HistoryEntry {
            message: message.to_string(),
            response: response.to_string(),
            timestamp: now.clone(),
        });
        if context.message_history.len() > MAX_HISTORY_ENTRIES {
            context.message_history.remove(0);
        }

        let significant = analyzer::significant_words(message);
        if !significant.is_empty() {
            let topic = significant[rng.pick_index(significant.len())].clone();
            context.recent_topics.insert(0, topic);
            if context.recent_topics.len() > MAX_RECENT_TOPICS {
                context.recent_topics.pop();
            }
        }

        context.last_active = now;
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Drop every conversation.
    pub fn reset(&mut self) {
        self.contexts.clear();
    }
}
