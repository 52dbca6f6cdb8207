//! Candidate phrase decomposition: full text, then 3-word windows,
//! 2-word windows and single words, each passed through the significance filter.

use crate::config::MatchConfig;

use super::normalize::is_significant_phrase;

/// Generate candidate phrases in priority order. Duplicates across
/// window sizes are kept; callers dedupe results, not phrases.
pub fn generate_phrases(config: &MatchConfig, text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut phrases = Vec::with_capacity(words.len() * 3 + 1);
    let mut push = |phrase: String| {
        if is_significant_phrase(config, &phrase) {
            phrases.push(phrase);
        }
    };

    push(words.join(" "));
    for size in [3, 2] {
        if words.len() >= size {
            for window in words.windows(size) {
                push(window.join(" "));
            }
        }
    }
    for word in &words {
        push((*word).to_string());
    }

    phrases
}
