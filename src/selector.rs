//! Persona-conditioned response selection
//!
//! The persona × intent reply tables are data, not logic: they live in
//! `assets/personas.json` and are parsed once on first use. Selection is a
//! pure function of its inputs plus the injected random source.

use crate::analyzer::{Intent, Sentiment, SentimentLabel};
use crate::knowledge::KnowledgeStore;
use crate::rng::RandomSource;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Fallback when the requested persona is unknown.
pub const DEFAULT_PERSONA: &str = "friendly";

/// Chance of acknowledging a non-neutral sentiment.
const SENTIMENT_SUFFIX_CHANCE: f64 = 0.5;
/// Chance of calling back to a recent topic.
const TOPIC_CALLBACK_CHANCE: f64 = 0.3;

const POSITIVE_SUFFIX: &str = " Saya senang mendengar hal itu!";
const NEGATIVE_SUFFIX: &str = " Saya harap saya bisa membantu.";

const PERSONA_TABLE_JSON: &str = include_str!("../assets/personas.json");

#[derive(Debug, Deserialize)]
struct IntentBuckets {
    greeting: Vec<String>,
    thanks: Vec<String>,
    question: Vec<String>,
    farewell: Vec<String>,
    help: Vec<String>,
    general: Vec<String>,
}

impl IntentBuckets {
    fn bucket(&self, intent: Intent) -> &[String] {
        match intent {
            Intent::Greeting => &self.greeting,
            Intent::Thanks => &self.thanks,
            Intent::Question => &self.question,
            Intent::Farewell => &self.farewell,
            Intent::Help => &self.help,
            Intent::General => &self.general,
        }
    }
}

// Bundled asset, validated at first access.
static PERSONA_TABLE: Lazy<HashMap<String, IntentBuckets>> = Lazy::new(|| {
    serde_json::from_str(PERSONA_TABLE_JSON).expect("bundled personas.json must parse")
});

fn buckets_for(persona: &str) -> &'static IntentBuckets {
    let lower = persona.to_lowercase();
    PERSONA_TABLE
        .get(&lower)
        .unwrap_or_else(|| &PERSONA_TABLE[DEFAULT_PERSONA])
}

/// Registered persona names, in table order.
pub fn persona_names() -> Vec<&'static str> {
    PERSONA_TABLE.keys().map(|k| k.as_str()).collect()
}

/// Template candidates for a persona/intent pair, after fallback
/// resolution. Exposed so callers can assert membership without relying
/// on which candidate the random source picked.
pub fn candidate_responses(persona: &str, intent: Intent) -> &'static [String] {
    buckets_for(persona).bucket(intent)
}

/// Assemble a reply for one analyzed message.
///
/// Starts from a uniform-random template for (persona, intent). For
/// questions about an entity the engine has learned responses for, the
/// template is replaced by one of those learned responses. Non-neutral
/// sentiment sometimes earns an acknowledgement suffix, and a recent
/// topic is sometimes called back at the end.
pub fn select(
    persona: &str,
    intent: Intent,
    entities: &[String],
    sentiment: &Sentiment,
    recent_topics: &[String],
    knowledge: &KnowledgeStore,
    rng: &mut dyn RandomSource,
) -> String {
    let candidates = candidate_responses(persona, intent);
    let mut text = candidates[rng.pick_index(candidates.len())].clone();

    if intent == Intent::Question {
        if let Some(top_entity) = entities.first() {
            if let Some(entry) = knowledge.keyword(top_entity) {
                if !entry.responses.is_empty() {
                    text = entry.responses[rng.pick_index(entry.responses.len())].clone();
                }
            }
        }
    }

    match sentiment.label {
        SentimentLabel::Positive if rng.chance(SENTIMENT_SUFFIX_CHANCE) => {
            text.push_str(POSITIVE_SUFFIX);
        }
        SentimentLabel::Negative if rng.chance(SENTIMENT_SUFFIX_CHANCE) => {
            text.push_str(NEGATIVE_SUFFIX);
        }
        _ => {}
    }

    if !recent_topics.is_empty() && rng.chance(TOPIC_CALLBACK_CHANCE) {
        let topic = &recent_topics[rng.pick_index(recent_topics.len())];
        text.push_str(&format!(
            " Ngomong-ngomong, kita tadi membahas tentang {}, ya?",
            topic
        ));
    }

    text
}
