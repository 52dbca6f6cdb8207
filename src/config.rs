//! Matching configuration: every threshold, weight, word list and cache cap
//! the engine consults. Read-only once a `GlossaryMatcher` is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Base fuzzy threshold before any multipliers.
    pub fuzzy_threshold: f64,
    /// Always applied on top of `fuzzy_threshold`.
    pub threshold_increase_multiplier: f64,
    /// Extra multiplier for passive (auto-triggered) searches.
    pub auto_search_multiplier: f64,
    /// Extra multiplier when a single-word phrase is the best match for a multi-word entry.
    pub single_word_long_entry_multiplier: f64,

    /// Score for a whole-word hit of a short phrase inside an entry.
    pub whole_word_score: f64,
    /// Baseline score for a morphological word variation.
    pub word_variation_score: f64,
    pub word_similarity_min: f64,
    /// Normalized words shorter than this must match exactly.
    pub min_fuzzy_word_len: usize,
    pub max_word_len_diff: usize,
    /// A word is significant when longer than this (in chars).
    pub min_significant_len: usize,
    /// Suffix stripping never leaves fewer chars than this.
    pub min_stem_len: usize,

    pub position_decay: f64,
    pub overlap_weight: f64,
    pub position_weight: f64,
    /// Overlap must exceed this before edit similarity is blended in.
    pub min_overlap: f64,
    pub edit_similarity_weight: f64,
    pub overlap_blend_weight: f64,
    /// Upper bound for substring-containment scores.
    pub partial_match_cap: f64,
    pub length_penalty_decay: f64,
    pub length_penalty_floor: f64,

    /// Phrases of at most this many chars take the short-phrase path.
    pub short_phrase_max_chars: usize,
    /// Manual queries with at most this many words skip decomposition.
    pub manual_literal_max_words: usize,
    pub max_results: usize,

    pub phrase_cache_cap: usize,
    pub similarity_cache_cap: usize,

    pub trailing_punctuation: String,
    /// Opening quotes and brackets stripped from the front of words and phrases.
    pub leading_punctuation: String,
    /// Tried in order; the first matching suffix is stripped.
    pub suffixes: Vec<String>,
    pub stop_words: Vec<String>,
    /// Marks that force-match any entry containing them.
    pub punctuation_marks: Vec<String>,
}

const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "as",
    "of", "in", "on", "at", "to", "for", "with", "by", "from", "into", "onto", "over",
    "under", "about", "after", "before", "between", "through", "during", "without",
    "within", "upon", "is", "are", "was", "were", "be", "been", "being", "am", "have",
    "has", "had", "do", "does", "did", "will", "would", "shall", "should", "can", "could",
    "may", "might", "must", "this", "that", "these", "those", "there", "here", "it", "its",
    "not", "no", "you", "your", "yours", "they", "their", "them", "we", "our", "what",
    "which", "when", "where", "while", "who", "whom", "whose", "also", "just", "very",
];

const DEFAULT_PUNCTUATION_MARKS: &[&str] = &[
    "...", "…", "\"", "“", "”", "!", "?", ":", "%", "&", "(", ")", "[", "]", "{", "}", "<",
    ">", "#", "@", "*", "~",
];

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.7,
            threshold_increase_multiplier: 1.1,
            auto_search_multiplier: 1.1,
            single_word_long_entry_multiplier: 1.1,
            whole_word_score: 0.9,
            word_variation_score: 0.85,
            word_similarity_min: 0.75,
            min_fuzzy_word_len: 5,
            max_word_len_diff: 2,
            min_significant_len: 3,
            min_stem_len: 3,
            position_decay: 0.5,
            overlap_weight: 0.7,
            position_weight: 0.3,
            min_overlap: 0.3,
            edit_similarity_weight: 0.4,
            overlap_blend_weight: 0.6,
            partial_match_cap: 0.95,
            length_penalty_decay: 0.85,
            length_penalty_floor: 0.5,
            short_phrase_max_chars: 3,
            manual_literal_max_words: 3,
            max_results: 50,
            phrase_cache_cap: 1000,
            similarity_cache_cap: 10_000,
            trailing_punctuation: ".,!?;:\"')]}…”’".to_string(),
            leading_punctuation: "\"'([{“‘¿¡".to_string(),
            suffixes: ["'s", "ing", "ed", "es", "s"].iter().map(|s| s.to_string()).collect(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            punctuation_marks: DEFAULT_PUNCTUATION_MARKS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl MatchConfig {
    /// Load a (possibly partial) JSON config; missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: MatchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("whole_word_score", self.whole_word_score),
            ("word_variation_score", self.word_variation_score),
            ("word_similarity_min", self.word_similarity_min),
            ("overlap_weight", self.overlap_weight),
            ("position_weight", self.position_weight),
            ("min_overlap", self.min_overlap),
            ("edit_similarity_weight", self.edit_similarity_weight),
            ("overlap_blend_weight", self.overlap_blend_weight),
            ("partial_match_cap", self.partial_match_cap),
            ("length_penalty_decay", self.length_penalty_decay),
            ("length_penalty_floor", self.length_penalty_floor),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }

        let multipliers = [
            ("threshold_increase_multiplier", self.threshold_increase_multiplier),
            ("auto_search_multiplier", self.auto_search_multiplier),
            ("single_word_long_entry_multiplier", self.single_word_long_entry_multiplier),
            ("position_decay", self.position_decay),
        ];
        for (name, value) in multipliers {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        if self.phrase_cache_cap == 0 || self.similarity_cache_cap == 0 {
            return Err(ConfigError::Invalid("cache caps must be > 0".into()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid("max_results must be > 0".into()));
        }
        Ok(())
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w.eq_ignore_ascii_case(word))
    }

    pub fn is_trailing_punctuation(&self, c: char) -> bool {
        self.trailing_punctuation.contains(c)
    }

    pub fn is_leading_punctuation(&self, c: char) -> bool {
        self.leading_punctuation.contains(c)
    }
}
