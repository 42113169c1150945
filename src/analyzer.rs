//! Text analysis primitives
//!
//! Stateless functions over raw message text: intent classification,
//! entity extraction, sentiment scoring, sentence fingerprinting, and
//! token-set similarity. Keyword lists are bilingual (Indonesian/English)
//! and fixed; there is no tokenizer beyond whitespace splitting.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============ Intent ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Thanks,
    Question,
    Farewell,
    Help,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Question => "question",
            Intent::Farewell => "farewell",
            Intent::Help => "help",
            Intent::General => "general",
        }
    }

    pub fn from_str(s: &str) -> Option<Intent> {
        match s.to_lowercase().as_str() {
            "greeting" => Some(Intent::Greeting),
            "thanks" => Some(Intent::Thanks),
            "question" => Some(Intent::Question),
            "farewell" => Some(Intent::Farewell),
            "help" => Some(Intent::Help),
            "general" => Some(Intent::General),
            _ => None,
        }
    }
}

// Trigger words per intent, checked in priority order. Substring matching,
// same as the keyword lists they came from.
const GREETING_WORDS: &[&str] = &["hai", "halo", "helo", "hi", "hello", "hey"];
const THANKS_WORDS: &[&str] = &["terima kasih", "makasih", "thx", "thank"];
const QUESTION_WORDS: &[&str] = &[
    "siapa", "apa", "mengapa", "bagaimana", "kapan", "dimana", "kemana", "kenapa",
];
const FAREWELL_WORDS: &[&str] = &["bye", "dadah", "sampai jumpa", "selamat tinggal"];
const HELP_WORDS: &[&str] = &["bantuan", "help", "tolong"];

/// Classify the coarse conversational intent of a message.
///
/// First matching keyword list wins; priority order is greeting, thanks,
/// question, farewell, help. No match falls through to `General`.
pub fn classify_intent(message: &str) -> Intent {
    let lower = message.to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if matches(GREETING_WORDS) {
        Intent::Greeting
    } else if matches(THANKS_WORDS) {
        Intent::Thanks
    } else if matches(QUESTION_WORDS) {
        Intent::Question
    } else if matches(FAREWELL_WORDS) {
        Intent::Farewell
    } else if matches(HELP_WORDS) {
        Intent::Help
    } else {
        Intent::General
    }
}

// ============ Entities & significant words ============

// Function words that never qualify as entity candidates.
const ENTITY_STOP_WORDS: &[&str] = &[
    "saya", "kamu", "dia", "mereka", "kita", "ini", "itu", "dan", "atau", "jika", "maka",
];

// Stop words for topic extraction and keyword learning.
const SIGNIFICANT_STOP_WORDS: &[&str] = &["adalah", "dengan", "untuk", "yang", "pada", "dari"];

/// Extract entity candidates: whitespace tokens longer than 3 characters
/// that are not stop words. Original casing is preserved; duplicates are
/// kept so repeated mentions count as repeated occurrences.
///
/// Pure function. Occurrence learning is the orchestrator's job
/// (`KnowledgeStore::record_keyword_occurrence`).
pub fn extract_entities(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .filter(|word| {
            let lower = word.to_lowercase();
            word.chars().count() > 3 && !ENTITY_STOP_WORDS.contains(&lower.as_str())
        })
        .map(|word| word.to_string())
        .collect()
}

/// Content words worth learning from: longer than 4 characters and not in
/// the significant-word stop list. Used for topic tracking and for deciding
/// which keywords a response gets attached to.
pub fn significant_words(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .filter(|word| {
            let lower = word.to_lowercase();
            word.chars().count() > 4 && !SIGNIFICANT_STOP_WORDS.contains(&lower.as_str())
        })
        .map(|word| word.to_string())
        .collect()
}

// ============ Sentiment ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    pub fn from_str(s: &str) -> Option<SentimentLabel> {
        match s.to_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: i32,
    pub label: SentimentLabel,
}

const POSITIVE_WORDS: &[&str] = &["senang", "bahagia", "suka", "bagus", "baik", "hebat", "keren"];
const NEGATIVE_WORDS: &[&str] = &["sedih", "marah", "kesal", "buruk", "jelek", "payah", "benci"];

/// Score message sentiment: +1 per positive word, -1 per negative word,
/// whole-token matches on the lowercased message. Label is the sign of
/// the total.
pub fn score_sentiment(message: &str) -> Sentiment {
    let lower = message.to_lowercase();
    let mut score = 0;

    for word in lower.split_whitespace() {
        if POSITIVE_WORDS.contains(&word) {
            score += 1;
        }
        if NEGATIVE_WORDS.contains(&word) {
            score -= 1;
        }
    }

    let label = if score > 0 {
        SentimentLabel::Positive
    } else if score < 0 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    Sentiment { score, label }
}

// ============ Pattern fingerprint ============

/// Coarse structural signature of a sentence: first word, a word-count
/// bucket, and the last word, all lowercased. `None` for messages with
/// fewer than two tokens.
pub fn fingerprint_pattern(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }

    let bucket = if words.len() < 5 {
        "short"
    } else if words.len() < 10 {
        "medium"
    } else {
        "long"
    };

    Some(format!("{}_{}_{}", words[0], bucket, words[words.len() - 1]))
}

// ============ Similarity ============

/// Jaccard similarity over the whitespace token sets of two strings.
/// Symmetric, bounded to [0, 1], and defined as 0 when both sets are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_priority_order() {
        assert_eq!(classify_intent("halo apa kabar"), Intent::Greeting);
        assert_eq!(classify_intent("terima kasih banyak"), Intent::Thanks);
        assert_eq!(classify_intent("siapa presiden pertama?"), Intent::Question);
        assert_eq!(classify_intent("sampai jumpa besok"), Intent::Farewell);
        assert_eq!(classify_intent("tolong jelaskan dong"), Intent::Help);
    }

    #[test]
    fn test_intent_fallback_general() {
        assert_eq!(classify_intent("cuaca cerah sore nanti"), Intent::General);
    }

    #[test]
    fn test_intent_roundtrip_strings() {
        for intent in [
            Intent::Greeting,
            Intent::Thanks,
            Intent::Question,
            Intent::Farewell,
            Intent::Help,
            Intent::General,
        ] {
            assert_eq!(Intent::from_str(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::from_str("unknown"), None);
    }

    #[test]
    fn test_extract_entities_filters_stop_words() {
        let entities = extract_entities("saya suka makan nasi goreng dan teh");
        assert_eq!(entities, vec!["suka", "makan", "nasi", "goreng"]);
    }

    #[test]
    fn test_extract_entities_is_pure() {
        let message = "belajar pemrograman itu menyenangkan";
        let first = extract_entities(message);
        let second = extract_entities(message);
        assert_eq!(first, second);
    }

    #[test]
    fn test_significant_words() {
        let words = significant_words("belajar dengan tekun untuk ujian");
        assert_eq!(words, vec!["belajar", "tekun", "ujian"]);
    }

    #[test]
    fn test_sentiment_positive() {
        let sentiment = score_sentiment("saya senang dan bahagia");
        assert_eq!(sentiment.score, 2);
        assert_eq!(sentiment.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_sentiment_negative() {
        let sentiment = score_sentiment("saya sedih dan marah");
        assert_eq!(sentiment.score, -2);
        assert_eq!(sentiment.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_sentiment_neutral() {
        let sentiment = score_sentiment("saya makan nasi");
        assert_eq!(sentiment.score, 0);
        assert_eq!(sentiment.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_fingerprint_buckets() {
        assert_eq!(fingerprint_pattern("halo"), None);
        assert_eq!(
            fingerprint_pattern("Halo apa kabar"),
            Some("halo_short_kabar".to_string())
        );
        assert_eq!(
            fingerprint_pattern("satu dua tiga empat lima enam"),
            Some("satu_medium_enam".to_string())
        );
        assert_eq!(
            fingerprint_pattern("a b c d e f g h i j k"),
            Some("a_long_k".to_string())
        );
    }

    #[test]
    fn test_similarity_symmetry_and_bounds() {
        let pairs = [
            ("halo apa kabar", "halo apa kabar hari ini"),
            ("satu dua tiga", "empat lima enam"),
            ("a b c", "a b c"),
            ("", "kata"),
        ];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert_eq!(s, similarity(b, a));
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_similarity_identity_and_empty() {
        assert_eq!(similarity("halo apa kabar", "halo apa kabar"), 1.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn test_similarity_collapses_duplicates() {
        // Token sets, not bags: repeated words do not inflate the score.
        assert_eq!(similarity("halo halo halo", "halo"), 1.0);
    }
}
