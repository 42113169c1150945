//! Knowledge base
//!
//! Mutable in-memory store the engine learns into: per-keyword statistics,
//! sentence-pattern counts, raw word frequencies, and operator-defined
//! custom responses. All maps preserve insertion order; the tie-break and
//! first-match rules below depend on it.

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Most-recent distinct responses kept per keyword.
pub const MAX_KEYWORD_RESPONSES: usize = 5;
/// Most-recent sentiment labels kept per keyword.
pub const MAX_KEYWORD_SENTIMENTS: usize = 10;

// ============ Entries ============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeywordEntry {
    pub count: u64,
    pub last_seen: String,
    #[serde(default)]
    pub responses: Vec<String>,
    #[serde(default)]
    pub sentiments: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopItem {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SentimentDistribution {
    pub positive: String,
    pub neutral: String,
    pub negative: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KnowledgeStatistics {
    pub total_keywords: usize,
    pub top_keywords: Vec<TopItem>,
    pub top_patterns: Vec<TopItem>,
    pub sentiment_distribution: SentimentDistribution,
    pub total_custom_responses: usize,
}

// ============ Store ============

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KnowledgeStore {
    #[serde(default)]
    pub keywords: IndexMap<String, KeywordEntry>,
    #[serde(default)]
    pub patterns: IndexMap<String, u64>,
    #[serde(default)]
    pub frequencies: IndexMap<String, u64>,
    #[serde(default)]
    pub custom_responses: IndexMap<String, String>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(&self, word: &str) -> Option<&KeywordEntry> {
        self.keywords.get(&word.to_lowercase())
    }

    /// Create or update the entry for a keyword. A supplied response is
    /// pushed only if not already present, keeping the 5 most recent;
    /// a supplied sentiment label keeps the 10 most recent. `last_seen`
    /// is refreshed on every call.
    pub fn record_keyword_occurrence(
        &mut self,
        word: &str,
        response: Option<&str>,
        sentiment: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        let entry = self
            .keywords
            .entry(word.to_lowercase())
            .and_modify(|e| e.count += 1)
            .or_insert_with(|| KeywordEntry {
                count: 1,
                last_seen: now.clone(),
                responses: Vec::new(),
                sentiments: Vec::new(),
            });
        entry.last_seen = now;

        if let Some(response) = response {
            if !entry.responses.iter().any(|r| r == response) {
                entry.responses.push(response.to_string());
                if entry.responses.len() > MAX_KEYWORD_RESPONSES {
                    let excess = entry.responses.len() - MAX_KEYWORD_RESPONSES;
                    entry.responses.drain(..excess);
                }
            }
        }

        if let Some(sentiment) = sentiment {
            entry.sentiments.push(sentiment.to_string());
            if entry.sentiments.len() > MAX_KEYWORD_SENTIMENTS {
                let excess = entry.sentiments.len() - MAX_KEYWORD_SENTIMENTS;
                entry.sentiments.drain(..excess);
            }
        }
    }

    /// Increment the raw frequency count for a word. Words shorter than
    /// 3 characters are skipped, independent of any stop-word list.
    pub fn record_frequency(&mut self, word: &str) {
        let word = word.to_lowercase();
        if word.chars().count() < 3 {
            return;
        }
        *self.frequencies.entry(word).or_insert(0) += 1;
    }

    /// Increment the occurrence count of a sentence fingerprint.
    pub fn record_pattern(&mut self, fingerprint: &str) {
        *self.patterns.entry(fingerprint.to_string()).or_insert(0) += 1;
    }

    /// Look up a custom response for a message: exact lowercase match
    /// first, then the first registered trigger contained in the message.
    /// Partial matching walks triggers in insertion order, so the first
    /// registered matching trigger wins.
    pub fn lookup_custom_response(&self, message: &str) -> Option<&str> {
        let lower = message.to_lowercase();
        let lower = lower.trim();

        if let Some(response) = self.custom_responses.get(lower) {
            return Some(response.as_str());
        }

        self.custom_responses
            .iter()
            .find(|(trigger, _)| lower.contains(trigger.as_str()))
            .map(|(_, response)| response.as_str())
    }

    /// Register or overwrite a custom trigger. Keys are case-insensitive.
    pub fn set_custom_response(&mut self, trigger: &str, response: &str) {
        self.custom_responses
            .insert(trigger.to_lowercase(), response.to_string());
    }

    /// Top keywords by occurrence count, descending. Stable sort: ties
    /// keep insertion order.
    pub fn top_keywords_by_count(&self, n: usize) -> Vec<TopItem> {
        let mut items: Vec<TopItem> = self
            .keywords
            .iter()
            .map(|(key, entry)| TopItem {
                key: key.clone(),
                count: entry.count,
            })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count));
        items.truncate(n);
        items
    }

    /// Top sentence patterns by occurrence count, descending, ties by
    /// insertion order.
    pub fn top_patterns_by_count(&self, n: usize) -> Vec<TopItem> {
        let mut items: Vec<TopItem> = self
            .patterns
            .iter()
            .map(|(key, count)| TopItem {
                key: key.clone(),
                count: *count,
            })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count));
        items.truncate(n);
        items
    }

    /// Percentage split of all sentiment labels ever recorded across
    /// keyword entries, one decimal place. All buckets read "0%" when
    /// nothing has been recorded.
    pub fn sentiment_distribution(&self) -> SentimentDistribution {
        let mut positive = 0u64;
        let mut neutral = 0u64;
        let mut negative = 0u64;

        for entry in self.keywords.values() {
            for label in &entry.sentiments {
                match label.as_str() {
                    "positive" => positive += 1,
                    "negative" => negative += 1,
                    _ => neutral += 1,
                }
            }
        }

        let total = positive + neutral + negative;
        let percent = |count: u64| {
            if total == 0 {
                "0%".to_string()
            } else {
                format!("{:.1}%", count as f64 / total as f64 * 100.0)
            }
        };

        SentimentDistribution {
            positive: percent(positive),
            neutral: percent(neutral),
            negative: percent(negative),
        }
    }

    /// Aggregate view over the whole store.
    pub fn statistics(&self) -> KnowledgeStatistics {
        KnowledgeStatistics {
            total_keywords: self.keywords.len(),
            top_keywords: self.top_keywords_by_count(10),
            top_patterns: self.top_patterns_by_count(5),
            sentiment_distribution: self.sentiment_distribution(),
            total_custom_responses: self.custom_responses.len(),
        }
    }

    /// Clear every sub-map. The only way entries disappear wholesale.
    pub fn reset(&mut self) {
        self.keywords.clear();
        self.patterns.clear();
        self.frequencies.clear();
        self.custom_responses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_occurrence_counts() {
        let mut store = KnowledgeStore::new();
        store.record_keyword_occurrence("Belajar", None, None);
        store.record_keyword_occurrence("belajar", None, None);

        let entry = store.keyword("belajar").unwrap();
        assert_eq!(entry.count, 2);
        assert!(entry.responses.is_empty());
    }

    #[test]
    fn test_response_cap_drops_oldest() {
        let mut store = KnowledgeStore::new();
        for i in 0..6 {
            store.record_keyword_occurrence("belajar", Some(&format!("R{}", i)), None);
        }

        let entry = store.keyword("belajar").unwrap();
        assert_eq!(entry.responses, vec!["R1", "R2", "R3", "R4", "R5"]);
    }

    #[test]
    fn test_response_dedup() {
        let mut store = KnowledgeStore::new();
        for _ in 0..6 {
            store.record_keyword_occurrence("belajar", Some("sama"), None);
        }

        let entry = store.keyword("belajar").unwrap();
        assert_eq!(entry.responses, vec!["sama"]);
        assert_eq!(entry.count, 6);
    }

    #[test]
    fn test_sentiment_cap() {
        let mut store = KnowledgeStore::new();
        for i in 0..12 {
            let label = if i < 6 { "positive" } else { "negative" };
            store.record_keyword_occurrence("belajar", None, Some(label));
        }

        let entry = store.keyword("belajar").unwrap();
        assert_eq!(entry.sentiments.len(), 10);
        // Oldest two positives evicted.
        assert_eq!(
            entry.sentiments.iter().filter(|s| *s == "positive").count(),
            4
        );
    }

    #[test]
    fn test_frequency_skips_short_words() {
        let mut store = KnowledgeStore::new();
        store.record_frequency("di");
        store.record_frequency("apa");
        store.record_frequency("apa");

        assert!(store.frequencies.get("di").is_none());
        assert_eq!(store.frequencies.get("apa"), Some(&2));
    }

    #[test]
    fn test_custom_response_exact_before_partial() {
        let mut store = KnowledgeStore::new();
        store.set_custom_response("halo", "partial");
        store.set_custom_response("halo semua", "exact");

        assert_eq!(store.lookup_custom_response("Halo semua"), Some("exact"));
    }

    #[test]
    fn test_custom_response_partial_first_registered_wins() {
        let mut store = KnowledgeStore::new();
        store.set_custom_response("kasih banyak", "first");
        store.set_custom_response("terima kasih", "second");

        // Both triggers match; insertion order decides.
        assert_eq!(
            store.lookup_custom_response("terima kasih banyak ya"),
            Some("first")
        );
    }

    #[test]
    fn test_custom_response_miss() {
        let store = KnowledgeStore::new();
        assert_eq!(store.lookup_custom_response("tidak ada"), None);
    }

    #[test]
    fn test_top_keywords_ties_keep_insertion_order() {
        let mut store = KnowledgeStore::new();
        store.record_keyword_occurrence("alpha", None, None);
        store.record_keyword_occurrence("beta", None, None);
        store.record_keyword_occurrence("gamma", None, None);
        store.record_keyword_occurrence("gamma", None, None);

        let top = store.top_keywords_by_count(3);
        assert_eq!(top[0].key, "gamma");
        assert_eq!(top[1].key, "alpha");
        assert_eq!(top[2].key, "beta");
    }

    #[test]
    fn test_sentiment_distribution_format() {
        let mut store = KnowledgeStore::new();
        assert_eq!(store.sentiment_distribution().positive, "0%");

        store.record_keyword_occurrence("belajar", None, Some("positive"));
        store.record_keyword_occurrence("belajar", None, Some("positive"));
        store.record_keyword_occurrence("belajar", None, Some("negative"));

        let dist = store.sentiment_distribution();
        assert_eq!(dist.positive, "66.7%");
        assert_eq!(dist.neutral, "0.0%");
        assert_eq!(dist.negative, "33.3%");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = KnowledgeStore::new();
        store.record_keyword_occurrence("belajar", Some("R"), Some("positive"));
        store.record_frequency("belajar");
        store.record_pattern("apa_short_itu");
        store.set_custom_response("halo", "hai");

        store.reset();

        assert!(store.keywords.is_empty());
        assert!(store.patterns.is_empty());
        assert!(store.frequencies.is_empty());
        assert!(store.custom_responses.is_empty());
        assert_eq!(store.statistics().total_keywords, 0);
    }
}
