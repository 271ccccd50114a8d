//! Grounding report for drafted replies.
//!
//! Purely informational: nothing here rewrites or rejects a reply.

use std::collections::HashSet;

use serde::Serialize;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "our", "with", "this", "that",
    "from", "have", "has", "was", "were", "will", "can", "any", "all", "its", "into", "per",
    "dear", "regards", "best", "thank", "thanks", "please", "hello", "team", "also", "would",
    "there", "which", "their", "they", "them", "than", "then", "been", "being", "about",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundingReport {
    /// The reply is exactly the fallback message.
    pub fallback: bool,
    /// Share of the reply's content words that also occur in the context.
    pub context_overlap: f32,
}

pub fn assess(reply: &str, context: &str, fallback_message: &str) -> GroundingReport {
    let fallback = reply.trim() == fallback_message.trim();

    let context_words: HashSet<String> = content_words(context).collect();
    let reply_words: Vec<String> = content_words(reply).collect();

    let context_overlap = if reply_words.is_empty() {
        0.0
    } else {
        let hits = reply_words
            .iter()
            .filter(|w| context_words.contains(*w))
            .count();
        hits as f32 / reply_words.len() as f32
    };

    GroundingReport {
        fallback,
        context_overlap,
    }
}

/// Lowercased words of three or more characters, or any token with a digit.
fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| t.chars().any(|c| c.is_ascii_digit()) || t.chars().count() >= 3)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}
