//! Keyword sentiment/intent tagger.
//!
//! Best-effort heuristics over free text. The result only flavors the reply
//! (encouragement lines, decline logging) and never gates the main flow, so
//! the tagger sits behind a trait and a stricter scorer can be swapped in
//! without touching the engine.

use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: &[&str] = &[
    "yes", "great", "awesome", "perfect", "love", "good", "excellent",
];

const NEGATIVE_WORDS: &[&str] = &[
    "no", "bad", "terrible", "worried", "concerned", "difficult",
];

const STOPWORDS: &[&str] = &["the", "and", "but", "for", "you", "are", "this", "that"];

/// Overall sentiment of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Coarse intent detected in a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Help,
    Buy,
    None,
}

/// Result of tagging one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAnalysis {
    pub sentiment: Sentiment,
    pub intent: Intent,
    pub confidence: f32,
    pub keywords: Vec<String>,
}

/// Pluggable scoring function over user input.
pub trait InputTagger: Send + Sync {
    fn analyze(&self, input: &str) -> InputAnalysis;
}

/// Default tagger: fixed keyword sets and first-match-wins intent checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTagger;

impl InputTagger for KeywordTagger {
    fn analyze(&self, input: &str) -> InputAnalysis {
        let lowered = input.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count();
        let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count();

        // Majority vote; ties and zero matches resolve to neutral.
        let sentiment = if positive > negative {
            Sentiment::Positive
        } else if negative > positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        let (intent, confidence) = if lowered.contains("help") || lowered.contains("assist") {
            (Intent::Help, 0.8)
        } else if lowered.contains("buy") || lowered.contains("purchase") {
            (Intent::Buy, 0.7)
        } else {
            (Intent::None, 0.0)
        };

        let keywords = words
            .iter()
            .filter(|w| w.len() > 3 && !STOPWORDS.contains(w))
            .map(|w| w.to_string())
            .collect();

        InputAnalysis {
            sentiment,
            intent,
            confidence,
            keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(input: &str) -> InputAnalysis {
        KeywordTagger.analyze(input)
    }

    #[test]
    fn positive_sentiment_wins_majority() {
        let a = analyze("yes that sounds great");
        assert_eq!(a.sentiment, Sentiment::Positive);
    }

    #[test]
    fn negative_sentiment_wins_majority() {
        let a = analyze("no I'm worried it will be bad");
        assert_eq!(a.sentiment, Sentiment::Negative);
    }

    #[test]
    fn tie_resolves_to_neutral() {
        let a = analyze("yes but no");
        assert_eq!(a.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn no_matches_resolves_to_neutral() {
        let a = analyze("what time is it");
        assert_eq!(a.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn help_intent_beats_buy() {
        // First-match-wins: "help" is checked before "buy".
        let a = analyze("help me buy a house");
        assert_eq!(a.intent, Intent::Help);
        assert_eq!(a.confidence, 0.8);
    }

    #[test]
    fn buy_intent() {
        let a = analyze("I want to purchase a home");
        assert_eq!(a.intent, Intent::Buy);
        assert_eq!(a.confidence, 0.7);
    }

    #[test]
    fn no_intent_has_zero_confidence() {
        let a = analyze("hello there");
        assert_eq!(a.intent, Intent::None);
        assert_eq!(a.confidence, 0.0);
    }

    #[test]
    fn keywords_drop_short_words_and_stopwords() {
        let a = analyze("I love this house and the garden");
        assert!(a.keywords.contains(&"love".to_string()));
        assert!(a.keywords.contains(&"house".to_string()));
        assert!(a.keywords.contains(&"garden".to_string()));
        // "this" and "the" are stopwords, "I" and "and" are short/stopped.
        assert!(!a.keywords.contains(&"this".to_string()));
        assert!(!a.keywords.contains(&"the".to_string()));
    }

    #[test]
    fn analysis_serde_roundtrip() {
        let a = analyze("yes please help me");
        let json = serde_json::to_string(&a).unwrap();
        let parsed: InputAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, a);
    }
}
