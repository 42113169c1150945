//! Kawan - self-learning conversational response engine
//!
//! Given an incoming message, a conversation id, and a persona, the engine
//! classifies intent, scores sentiment, checks for operator overrides and
//! repeated questions, selects or synthesizes a reply, and learns from the
//! exchange into a persistent knowledge base.
//!
//! Everything is synchronous and single-threaded: one engine instance owns
//! its knowledge base and all conversation contexts, and callers serialize
//! access. The persistence backend only ever holds a serialized snapshot.

pub mod analyzer;
pub mod context;
pub mod knowledge;
pub mod logging;
pub mod persistence;
pub mod rng;
pub mod selector;

use analyzer::Intent;
use chrono::Utc;
use context::{ContextMemory, ConversationContext};
use knowledge::{KnowledgeStatistics, KnowledgeStore};
use persistence::{ExportBlob, ImportedSnapshot, PersistenceAdapter, Snapshot, UserStats};
use rng::{RandomSource, ThreadRandom};
use serde::Serialize;

// ============ Statistics ============

#[derive(Debug, Serialize, Clone)]
pub struct EngineStatistics {
    pub knowledge: KnowledgeStatistics,
    pub usage: UserStats,
    pub active_conversations: usize,
}

// ============ Engine ============

/// One engine instance: owned knowledge base, conversation contexts, usage
/// counters, an injected persistence collaborator, and an injected random
/// source. Multiple instances are fully independent.
pub struct LearningEngine {
    knowledge: KnowledgeStore,
    contexts: ContextMemory,
    stats: UserStats,
    persistence: PersistenceAdapter,
    rng: Box<dyn RandomSource>,
}

impl LearningEngine {
    /// Build an engine on the given persistence adapter, restoring any
    /// prior snapshot. A missing or malformed snapshot starts empty.
    pub fn new(persistence: PersistenceAdapter) -> Self {
        Self::with_random_source(persistence, Box::new(ThreadRandom))
    }

    /// Same as `new`, with an explicit random source. Tests use this to
    /// pin the nondeterministic selection paths.
    pub fn with_random_source(
        persistence: PersistenceAdapter,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let snapshot = persistence.load();
        match &snapshot {
            Some(_) => logging::log_persistence(None, "engine restored from stored snapshot"),
            None => logging::log_persistence(None, "no prior state, starting empty"),
        }
        let snapshot = snapshot.unwrap_or_default();

        Self {
            knowledge: snapshot.knowledge_base,
            contexts: snapshot.context_memory,
            stats: snapshot.user_stats,
            persistence,
            rng,
        }
    }

    /// Produce a reply for one incoming message.
    ///
    /// Pipeline: analyze intent and entities (recording keyword
    /// occurrences), score sentiment, then in order: custom-response
    /// override, repeated-question replay, persona-conditioned selection.
    /// Only the selection path learns from the exchange. The caller is
    /// responsible for `record_turn` once the reply has been delivered.
    pub fn generate_response(
        &mut self,
        message: &str,
        conversation_id: &str,
        persona: &str,
    ) -> String {
        let intent = analyzer::classify_intent(message);
        let entities = analyzer::extract_entities(message);
        for entity in &entities {
            self.knowledge.record_keyword_occurrence(entity, None, None);
        }
        let sentiment = analyzer::score_sentiment(message);
        self.stats.total_messages += 1;

        // Operator overrides win over everything, including learning.
        if let Some(custom) = self.knowledge.lookup_custom_response(message) {
            let custom = custom.to_string();
            self.stats.custom_response_hits += 1;
            logging::log_response(Some(conversation_id), "custom response override");
            return custom;
        }

        // Seen this question before: replay the best previous answer.
        if self.contexts.is_repeated_question(message, conversation_id) {
            if let Some(previous) = self
                .contexts
                .previous_response_for(message, conversation_id)
            {
                self.stats.repeat_question_hits += 1;
                logging::log_response(Some(conversation_id), "repeated question, replaying answer");
                return previous;
            }
        }

        let context = self.contexts.get(conversation_id);
        let response = selector::select(
            persona,
            intent,
            &entities,
            &sentiment,
            &context.recent_topics,
            &self.knowledge,
            self.rng.as_mut(),
        );

        self.learn_from_exchange(message, &response, intent, sentiment.label.as_str());
        logging::log_response(
            Some(conversation_id),
            &format!("selected response, intent={}", intent.as_str()),
        );
        self.persist();

        response
    }

    /// Attach the exchange to the knowledge base: keyword responses and
    /// sentiments for significant words, raw word frequencies, and the
    /// sentence-pattern count.
    fn learn_from_exchange(
        &mut self,
        message: &str,
        response: &str,
        intent: Intent,
        sentiment_label: &str,
    ) {
        for word in analyzer::significant_words(message) {
            self.knowledge
                .record_keyword_occurrence(&word, Some(response), Some(sentiment_label));
        }

        for word in message.to_lowercase().split_whitespace() {
            self.knowledge.record_frequency(word);
        }

        if let Some(fingerprint) = analyzer::fingerprint_pattern(message) {
            self.knowledge.record_pattern(&fingerprint);
        }

        logging::log_learning(
            None,
            &format!(
                "learned exchange: intent={}, sentiment={}",
                intent.as_str(),
                sentiment_label
            ),
        );
    }

    /// Record a completed turn in the conversation context and persist.
    /// Invoked by the caller after the response has been delivered.
    pub fn record_turn(&mut self, message: &str, response: &str, conversation_id: &str) {
        self.contexts
            .append_turn(message, response, conversation_id, self.rng.as_mut());
        logging::log_context(Some(conversation_id), "turn appended to history");
        self.persist();
    }

    /// Register an operator-defined trigger -> response override.
    pub fn set_custom_response(&mut self, trigger: &str, response: &str) {
        self.knowledge.set_custom_response(trigger, response);
        logging::log_learning(None, &format!("custom response set for '{}'", trigger));
        self.persist();
    }

    /// Context for one conversation (a fresh empty one if never seen).
    pub fn context(&self, conversation_id: &str) -> ConversationContext {
        self.contexts.get(conversation_id)
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            knowledge: self.knowledge.statistics(),
            usage: self.stats.clone(),
            active_conversations: self.contexts.len(),
        }
    }

    // ============ Export / import / reset ============

    /// Serialize the full state plus an export timestamp into a
    /// self-contained transferable blob.
    pub fn export_data(&self) -> String {
        let blob = ExportBlob {
            snapshot: self.snapshot(),
            export_date: Utc::now().to_rfc3339(),
        };
        match serde_json::to_string(&blob) {
            Ok(json) => json,
            Err(e) => {
                logging::log_error(None, &format!("export failed to serialize: {}", e));
                String::new()
            }
        }
    }

    /// Replace the engine state from an exported blob and persist.
    /// A sub-map absent from the blob keeps its current contents; only
    /// the fields the blob carries are replaced. Returns false on any
    /// parse failure, leaving the current state untouched.
    pub fn import_data(&mut self, data: &str) -> bool {
        let imported: ImportedSnapshot = match serde_json::from_str(data) {
            Ok(imported) => imported,
            Err(e) => {
                logging::log_error(None, &format!("import rejected, malformed blob: {}", e));
                return false;
            }
        };

        if let Some(knowledge) = imported.knowledge_base {
            self.knowledge = knowledge;
        }
        if let Some(contexts) = imported.context_memory {
            self.contexts = contexts;
        }
        if let Some(stats) = imported.user_stats {
            self.stats = stats;
        }
        logging::log_persistence(None, "state replaced from imported blob");
        self.persist();
        true
    }

    /// Clear the knowledge base, all conversation contexts, and usage
    /// counters, then persist the empty snapshot.
    pub fn reset(&mut self) {
        self.knowledge.reset();
        self.contexts.reset();
        self.stats = UserStats::default();
        logging::log_persistence(None, "engine reset to empty state");
        self.persist();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            knowledge_base: self.knowledge.clone(),
            context_memory: self.contexts.clone(),
            user_stats: self.stats.clone(),
        }
    }

    /// Write-through persistence: failures are logged by the adapter and
    /// never disturb in-memory state.
    fn persist(&mut self) {
        let snapshot = self.snapshot();
        self.persistence.save(&snapshot);
    }
}
