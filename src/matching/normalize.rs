//! Word normalization and the significance filter.
//! Folds case, edge punctuation and one inflectional suffix so that
//! plural/tense variants compare equal without a real stemmer.

use crate::config::MatchConfig;

use super::similarity::similarity;

/// Strip opening quotes/brackets from the front and punctuation from the end.
pub fn trim_edge_punctuation<'a>(config: &MatchConfig, text: &'a str) -> &'a str {
    text.trim()
        .trim_start_matches(|c| config.is_leading_punctuation(c))
        .trim_end_matches(|c| config.is_trailing_punctuation(c))
}

/// Lowercase, strip edge punctuation, then strip the first configured
/// suffix that matches. Never strips more than one suffix.
pub fn normalize_word(config: &MatchConfig, word: &str) -> String {
    let lowered = word.to_lowercase();
    let trimmed = trim_edge_punctuation(config, &lowered);

    for suffix in &config.suffixes {
        if let Some(stem) = trimmed.strip_suffix(suffix.as_str()) {
            if stem.chars().count() >= config.min_stem_len {
                return stem.to_string();
            }
            break;
        }
    }
    trimmed.to_string()
}

/// Case- and edge-punctuation-insensitive form of a phrase.
pub fn fold_phrase(config: &MatchConfig, phrase: &str) -> String {
    let lowered = phrase.trim().to_lowercase();
    let folded = trim_edge_punctuation(config, &lowered);
    // A phrase made only of punctuation keeps its literal form.
    if folded.is_empty() {
        lowered
    } else {
        folded.to_string()
    }
}

pub fn is_significant_word(config: &MatchConfig, word: &str) -> bool {
    let trimmed = trim_edge_punctuation(config, word);
    trimmed.chars().count() > config.min_significant_len && !config.is_stop_word(trimmed)
}

/// A phrase is significant when at least one of its words is.
pub fn is_significant_phrase(config: &MatchConfig, phrase: &str) -> bool {
    phrase
        .split_whitespace()
        .any(|word| is_significant_word(config, word))
}

/// Compare two words as morphological variants. Returns the normalized
/// similarity when they are considered the same word.
pub fn word_variation<F>(config: &MatchConfig, w1: &str, w2: &str, sim: F) -> Option<f64>
where
    F: FnMut(&str, &str) -> f64,
{
    let n1 = normalize_word(config, w1);
    let n2 = normalize_word(config, w2);
    normalized_variation(config, &n1, &n2, sim)
}

/// `word_variation` for inputs already passed through `normalize_word`.
pub fn normalized_variation<F>(config: &MatchConfig, n1: &str, n2: &str, mut sim: F) -> Option<f64>
where
    F: FnMut(&str, &str) -> f64,
{
    if n1.is_empty() || n2.is_empty() {
        return None;
    }

    let len1 = n1.chars().count();
    let len2 = n2.chars().count();
    if len1 < config.min_fuzzy_word_len || len2 < config.min_fuzzy_word_len {
        return (n1 == n2).then_some(1.0);
    }
    if len1.abs_diff(len2) > config.max_word_len_diff {
        return None;
    }

    let score = sim(n1, n2);
    (score >= config.word_similarity_min).then_some(score)
}

pub fn are_words_similar(config: &MatchConfig, w1: &str, w2: &str) -> bool {
    word_variation(config, w1, w2, similarity).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_suffix_only() {
        let config = MatchConfig::default();
        assert_eq!(normalize_word(&config, "Ranks"), "rank");
        assert_eq!(normalize_word(&config, "loading"), "load");
        assert_eq!(normalize_word(&config, "avatar's"), "avatar");
        // "es" is tried before "s" and only one suffix goes
        assert_eq!(normalize_word(&config, "boxes"), "box");
        assert_eq!(normalize_word(&config, "settings,"), "setting");
    }

    #[test]
    fn short_stems_are_kept_whole() {
        let config = MatchConfig::default();
        assert_eq!(normalize_word(&config, "is"), "is");
        assert_eq!(normalize_word(&config, "uses"), "uses");
    }

    #[test]
    fn significance() {
        let config = MatchConfig::default();
        assert!(!is_significant_phrase(&config, "the of and"));
        assert!(!is_significant_phrase(&config, "with"));
        assert!(!is_significant_phrase(&config, "cat"));
        assert!(is_significant_phrase(&config, "avatar"));
        assert!(is_significant_phrase(&config, "of the avatar"));
        assert!(!is_significant_phrase(&config, ""));
    }

    #[test]
    fn word_variations() {
        let config = MatchConfig::default();
        assert!(are_words_similar(&config, "Avatar", "avatars"));
        assert!(are_words_similar(&config, "ranked", "ranking"));
        assert!(!are_words_similar(&config, "avatar", "menu"));
        // short words need exact equality after normalization
        assert!(are_words_similar(&config, "cat", "cats"));
        assert!(!are_words_similar(&config, "cat", "car"));
        assert!(!are_words_similar(&config, "bank", "rank"));
        assert!(are_words_similar(&config, "ranks", "rank"));
    }

    #[test]
    fn length_gap_blocks_variation() {
        let config = MatchConfig {
            max_word_len_diff: 1,
            ..MatchConfig::default()
        };
        assert!(!are_words_similar(&config, "perform", "performance"));
    }

    #[test]
    fn fold_keeps_pure_punctuation() {
        let config = MatchConfig::default();
        assert_eq!(fold_phrase(&config, "Loading..."), "loading");
        assert_eq!(fold_phrase(&config, "..."), "...");
        assert_eq!(fold_phrase(&config, "(Settings)"), "settings");
        assert_eq!(fold_phrase(&config, "“Safety Settings”"), "safety settings");
        assert_eq!(normalize_word(&config, "\"Ranks\""), "rank");
    }
}
