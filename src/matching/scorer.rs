//! Composite phrase-vs-entry scoring.
//!
//! One rule table, every threshold a `MatchConfig` knob:
//! - exact (case-insensitive) equality with the source: 1.0. Edge
//!   punctuation may be dropped from the phrase, never from the source.
//! - short or single-word phrases: whole-word hit, or best word variation
//! - multi-word phrases: position-aware overlap, blended with edit
//!   similarity once overlap clears `min_overlap`; substring containment
//!   scores proportionally to length; capped at `partial_match_cap`, then
//!   penalized for word-count mismatch.
//!
//! Scores are clamped to [0, 1].

use regex::Regex;

use crate::config::MatchConfig;
use crate::glossary::GlossaryEntry;

use super::cache::MatchCache;
use super::normalize::{fold_phrase, normalize_word, normalized_variation};

pub const EXACT_SCORE: f64 = 1.0;

/// A glossary entry with the derived forms the scorer compares against.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub entry: GlossaryEntry,
    source_lowered: String,
    source_folded: String,
    target_folded: String,
    source_words: Vec<String>,
    target_words: Vec<String>,
}

impl IndexedEntry {
    pub fn new(config: &MatchConfig, entry: GlossaryEntry) -> Self {
        let normalize_all = |text: &str| -> Vec<String> {
            text.split_whitespace()
                .map(|w| normalize_word(config, w))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            source_lowered: entry.source.trim().to_lowercase(),
            source_folded: fold_phrase(config, &entry.source),
            target_folded: fold_phrase(config, &entry.target),
            source_words: normalize_all(&entry.source),
            target_words: normalize_all(&entry.target),
            entry,
        }
    }

    pub fn source_word_count(&self) -> usize {
        self.entry.source.split_whitespace().count()
    }
}

/// A candidate phrase prepared once per search and scored against every entry.
#[derive(Debug, Clone)]
pub struct PreparedPhrase {
    pub text: String,
    lowered: String,
    folded: String,
    words: Vec<String>,
    word_count: usize,
    short: bool,
    boundary: Option<Regex>,
}

impl PreparedPhrase {
    pub fn new(config: &MatchConfig, text: &str) -> Self {
        let folded = fold_phrase(config, text);
        let word_count = text.split_whitespace().count();
        let short = word_count <= 1 || folded.chars().count() <= config.short_phrase_max_chars;
        Self {
            text: text.trim().to_string(),
            lowered: text.trim().to_lowercase(),
            words: text
                .split_whitespace()
                .map(|w| normalize_word(config, w))
                .filter(|w| !w.is_empty())
                .collect(),
            word_count,
            short,
            boundary: if short { boundary_pattern(&folded) } else { None },
            folded,
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn is_single_word(&self) -> bool {
        self.word_count == 1
    }
}

/// `\b…\b` containment; a boundary is only asserted next to a word char.
fn boundary_pattern(folded: &str) -> Option<Regex> {
    let first = folded.chars().next()?;
    let last = folded.chars().last()?;
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if is_word(first) { r"\b" } else { "" };
    let trail = if is_word(last) { r"\b" } else { "" };
    Regex::new(&format!("(?i){lead}{}{trail}", regex::escape(folded))).ok()
}

pub struct Scorer<'a> {
    config: &'a MatchConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a MatchConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, phrase: &PreparedPhrase, entry: &IndexedEntry, cache: &mut MatchCache) -> f64 {
        if phrase.folded.is_empty() {
            return 0.0;
        }
        if phrase.lowered == entry.source_lowered || phrase.folded == entry.source_lowered {
            return EXACT_SCORE;
        }
        let score = if phrase.short {
            self.short_phrase_score(phrase, entry, cache)
        } else {
            self.multi_word_score(phrase, entry, cache)
        };
        score.clamp(0.0, 1.0)
    }

    fn short_phrase_score(&self, phrase: &PreparedPhrase, entry: &IndexedEntry, cache: &mut MatchCache) -> f64 {
        let whole_word = match &phrase.boundary {
            Some(re) if re.is_match(&entry.entry.source) || re.is_match(&entry.entry.target) => {
                self.config.whole_word_score
            }
            _ => 0.0,
        };

        let mut best_similarity: Option<f64> = None;
        for word in &phrase.words {
            for other in entry.source_words.iter().chain(&entry.target_words) {
                if let Some(sim) =
                    normalized_variation(self.config, word, other, |a, b| cache.similarity(a, b))
                {
                    best_similarity = Some(best_similarity.map_or(sim, |b| b.max(sim)));
                }
            }
        }

        let variation = best_similarity.map_or(0.0, |sim| self.variation_score(sim));
        whole_word.max(variation)
    }

    /// Baseline at the similarity floor, rising linearly to the whole-word score.
    fn variation_score(&self, similarity: f64) -> f64 {
        let base = self.config.word_variation_score;
        let top = self.config.whole_word_score.max(base);
        let span = 1.0 - self.config.word_similarity_min;
        if span <= f64::EPSILON {
            return top;
        }
        let t = ((similarity - self.config.word_similarity_min) / span).clamp(0.0, 1.0);
        top - (1.0 - t) * (top - base)
    }

    fn multi_word_score(&self, phrase: &PreparedPhrase, entry: &IndexedEntry, cache: &mut MatchCache) -> f64 {
        let fields = [
            (&entry.source_folded, &entry.source_words),
            (&entry.target_folded, &entry.target_words),
        ];

        let mut best: f64 = 0.0;
        for (folded, words) in fields {
            if folded.is_empty() {
                continue;
            }
            let mut score = 0.0;

            let overlap = self.overlap_score(&phrase.words, words);
            if overlap > self.config.min_overlap {
                let edit = cache.similarity(&phrase.folded, folded);
                score = edit * self.config.edit_similarity_weight
                    + overlap * self.config.overlap_blend_weight;
            }

            if folded.contains(phrase.folded.as_str()) {
                let ratio = phrase.folded.chars().count() as f64 / folded.chars().count() as f64;
                score = f64::max(score, ratio * self.config.partial_match_cap);
            }

            best = best.max(score);
        }

        // only source equality may reach a perfect score
        best.min(self.config.partial_match_cap)
            * self.length_penalty(phrase.word_count, entry.source_word_count())
    }

    /// Fraction of candidate words present in `target`, plus a bonus that
    /// decays with how far each word moved.
    pub fn overlap_score(&self, candidate: &[String], target: &[String]) -> f64 {
        if candidate.is_empty() || target.is_empty() {
            return 0.0;
        }

        let mut matches = 0usize;
        let mut position_total = 0.0;
        for (i, word) in candidate.iter().enumerate() {
            if let Some(j) = target.iter().position(|t| t == word) {
                matches += 1;
                position_total += 1.0 / (1.0 + i.abs_diff(j) as f64 * self.config.position_decay);
            }
        }
        if matches == 0 {
            return 0.0;
        }

        let match_ratio = matches as f64 / candidate.len() as f64;
        let avg_position = position_total / matches as f64;
        (match_ratio * self.config.overlap_weight + avg_position * self.config.position_weight)
            .clamp(0.0, 1.0)
    }

    pub fn length_penalty(&self, candidate_words: usize, entry_words: usize) -> f64 {
        if candidate_words == entry_words {
            return 1.0;
        }
        let diff = candidate_words.abs_diff(entry_words) as i32;
        self.config
            .length_penalty_decay
            .powi(diff)
            .max(self.config.length_penalty_floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (MatchConfig, MatchCache) {
        let config = MatchConfig::default();
        let cache = MatchCache::from_config(&config);
        (config, cache)
    }

    fn entry(config: &MatchConfig, source: &str, target: &str) -> IndexedEntry {
        IndexedEntry::new(config, GlossaryEntry::new(source, target, "", ""))
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn exact_match_ignores_case() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Avatar Performance Rank", "อันดับประสิทธิภาพอวตาร");
        let phrase = PreparedPhrase::new(&config, "avatar PERFORMANCE rank");
        assert_eq!(scorer.score(&phrase, &e, &mut cache), EXACT_SCORE);
    }

    #[test]
    fn exact_match_keeps_source_punctuation() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let ellipsis = entry(&config, "Loading...", "");
        let plain = entry(&config, "Rank", "");

        let score = scorer.score(&PreparedPhrase::new(&config, "loading"), &ellipsis, &mut cache);
        assert!(score < EXACT_SCORE, "{score}");
        assert_eq!(scorer.score(&PreparedPhrase::new(&config, "LOADING..."), &ellipsis, &mut cache), EXACT_SCORE);
        assert_eq!(scorer.score(&PreparedPhrase::new(&config, "Rank."), &plain, &mut cache), EXACT_SCORE);
        assert_eq!(scorer.score(&PreparedPhrase::new(&config, "(Rank)"), &plain, &mut cache), EXACT_SCORE);
    }

    #[test]
    fn single_word_whole_word_hit() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Avatar Performance Rank", "");
        let score = scorer.score(&PreparedPhrase::new(&config, "avatar"), &e, &mut cache);
        assert_eq!(score, config.whole_word_score);

        // no boundary inside a longer word, but still a close variation
        let e = entry(&config, "Avatars", "");
        let score = scorer.score(&PreparedPhrase::new(&config, "avatar"), &e, &mut cache);
        assert!(score >= config.word_variation_score && score < 1.0);
    }

    #[test]
    fn single_word_variation_scales_with_similarity() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Performances", "");
        let close = scorer.score(&PreparedPhrase::new(&config, "performance"), &e, &mut cache);
        let e = entry(&config, "Performer", "");
        let loose = scorer.score(&PreparedPhrase::new(&config, "performed"), &e, &mut cache);
        assert!(close > loose, "{close} <= {loose}");
        assert!(loose >= config.word_variation_score);
    }

    #[test]
    fn unrelated_word_scores_zero() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Avatar Performance Rank", "");
        assert_eq!(scorer.score(&PreparedPhrase::new(&config, "menu"), &e, &mut cache), 0.0);
    }

    #[test]
    fn overlap_rewards_aligned_positions() {
        let (config, _) = setup();
        let scorer = Scorer::new(&config);
        let target = words("avatar performance rank");
        let aligned = scorer.overlap_score(&words("avatar performance"), &target);
        let shifted = scorer.overlap_score(&words("rank avatar"), &target);
        let missing = scorer.overlap_score(&words("menu settings"), &target);
        assert_eq!(aligned, 1.0);
        assert!(shifted < aligned && shifted > 0.0);
        assert_eq!(missing, 0.0);
    }

    #[test]
    fn length_penalty_is_floored() {
        let (config, _) = setup();
        let scorer = Scorer::new(&config);
        assert_eq!(scorer.length_penalty(3, 3), 1.0);
        assert!((scorer.length_penalty(2, 3) - 0.85).abs() < 1e-12);
        assert_eq!(scorer.length_penalty(1, 20), config.length_penalty_floor);
    }

    #[test]
    fn multi_word_partial_phrase_is_below_exact() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Avatar Performance Rank", "");
        let score = scorer.score(&PreparedPhrase::new(&config, "avatar performance"), &e, &mut cache);
        assert!(score > 0.7 && score < 1.0, "{score}");

        let far = scorer.score(&PreparedPhrase::new(&config, "open the settings"), &e, &mut cache);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn multi_word_matches_target_side() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Safety Settings", "การตั้งค่า ความปลอดภัย");
        let score = scorer.score(&PreparedPhrase::new(&config, "การตั้งค่า ความปลอดภัย"), &e, &mut cache);
        assert!(score >= config.partial_match_cap - 1e-12, "{score}");
        assert!(score < 1.0);
    }

    #[test]
    fn punctuation_only_phrase_uses_literal_boundary() {
        let (config, mut cache) = setup();
        let scorer = Scorer::new(&config);
        let e = entry(&config, "Loading...", "");
        let score = scorer.score(&PreparedPhrase::new(&config, "..."), &e, &mut cache);
        assert_eq!(score, config.whole_word_score);
    }
}
