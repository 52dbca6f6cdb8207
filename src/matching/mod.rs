//! Fuzzy glossary matching engine.
//! Query text → candidate phrases → best phrase score per entry →
//! threshold → punctuation force-matches → dedup by (source, category) →
//! rank → truncate. Synchronous; the only state shared across calls is
//! the phrase/similarity cache, held under a mutex for the whole call.

pub mod cache;
pub mod normalize;
pub mod phrases;
pub mod scorer;
pub mod similarity;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::glossary::{Glossary, GlossaryEntry};
use crate::metrics::MetricsRegistry;
use crate::phase::{PhaseTracker, SearchPhase};

use cache::{CacheStats, MatchCache};
use normalize::is_significant_phrase;
use scorer::{IndexedEntry, PreparedPhrase, Scorer, EXACT_SCORE};

/// Where a search request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrigin {
    /// Typed into the search box.
    Manual,
    /// Background matching of the editor's current text.
    Auto,
}

/// One ranked match for a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub entry: GlossaryEntry,
    pub score: f64,
    pub matched_phrase: String,
}

impl MatchCandidate {
    pub fn is_exact(&self) -> bool {
        self.score >= EXACT_SCORE
    }

    fn phrase_word_count(&self) -> usize {
        self.matched_phrase.split_whitespace().count()
    }
}

/// Glossary entries plus their pre-folded forms.
struct ActiveGlossary {
    version: u32,
    entries: Vec<IndexedEntry>,
}

/// Best phrase found for one entry.
struct ScoredEntry {
    index: usize,
    score: f64,
    phrase: usize,
}

pub struct GlossaryMatcher {
    config: MatchConfig,
    glossary: RwLock<Arc<ActiveGlossary>>,
    cache: Mutex<MatchCache>,
    metrics: Arc<MetricsRegistry>,
}

impl GlossaryMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(config: MatchConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let cache = MatchCache::from_config(&config);
        Self {
            config,
            glossary: RwLock::new(Arc::new(ActiveGlossary {
                version: 0,
                entries: Vec::new(),
            })),
            cache: Mutex::new(cache),
            metrics,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Replace the active glossary. The string-keyed caches stay valid.
    pub fn load_glossary(&self, glossary: Glossary) {
        let version = glossary.version();
        let entries: Vec<IndexedEntry> = glossary
            .into_entries()
            .into_iter()
            .map(|entry| IndexedEntry::new(&self.config, entry))
            .collect();
        info!(entries = entries.len(), version, "glossary activated");
        *self.glossary.write() = Arc::new(ActiveGlossary { version, entries });
    }

    pub fn load_entries(&self, entries: Vec<GlossaryEntry>) {
        self.load_glossary(Glossary::from_entries(0, entries));
    }

    pub fn glossary_len(&self) -> usize {
        self.glossary.read().entries.len()
    }

    pub fn glossary_version(&self) -> u32 {
        self.glossary.read().version
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Ranked, deduplicated glossary matches for `query`.
    /// Never fails: empty queries or glossaries yield no matches.
    pub fn search(&self, query: &str, origin: SearchOrigin) -> Vec<MatchCandidate> {
        let glossary = self.glossary.read().clone();
        let mut cache = self.cache.lock();
        let mut phases = PhaseTracker::new(&self.metrics);

        let query = query.trim();
        if query.is_empty() || glossary.entries.is_empty() {
            phases.advance(SearchPhase::Done);
            return Vec::new();
        }

        phases.advance(SearchPhase::Decomposing);
        let phrases = self.candidate_phrases(query, origin, &mut cache);
        let prepared: Vec<PreparedPhrase> = phrases
            .iter()
            .map(|p| PreparedPhrase::new(&self.config, p))
            .collect();

        phases.advance(SearchPhase::Scoring);
        let scored = self.score_entries(&glossary.entries, &prepared, &mut cache);

        phases.advance(SearchPhase::Thresholding);
        let mut matches: Vec<MatchCandidate> = scored
            .into_iter()
            .filter_map(|s| {
                let entry = &glossary.entries[s.index];
                let phrase = &prepared[s.phrase];
                let threshold = self.effective_threshold(origin, phrase, entry);
                (s.score >= threshold).then(|| MatchCandidate {
                    entry: entry.entry.clone(),
                    score: s.score,
                    matched_phrase: phrase.text.clone(),
                })
            })
            .collect();
        matches.extend(self.punctuation_matches(query, &glossary.entries));

        phases.advance(SearchPhase::Deduping);
        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(matches.len());
        matches.retain(|m| seen.insert((m.entry.source.clone(), m.entry.category.clone())));

        phases.advance(SearchPhase::Ranking);
        rank(&mut matches);
        matches.truncate(self.config.max_results);

        cache.enforce_caps();
        phases.advance(SearchPhase::Done);

        debug!(
            origin = ?origin,
            query_chars = query.chars().count(),
            phrases = prepared.len(),
            matches = matches.len(),
            "search complete"
        );
        matches
    }

    /// Manual short queries are matched literally; everything else is decomposed.
    fn candidate_phrases(&self, query: &str, origin: SearchOrigin, cache: &mut MatchCache) -> Arc<[String]> {
        let literal = origin == SearchOrigin::Manual
            && query.split_whitespace().count() <= self.config.manual_literal_max_words;
        if !literal {
            return cache.phrases(&self.config, query);
        }
        if is_significant_phrase(&self.config, query) {
            Arc::from(vec![query.to_string()])
        } else {
            Arc::from(Vec::new())
        }
    }

    fn score_entries(
        &self,
        entries: &[IndexedEntry],
        phrases: &[PreparedPhrase],
        cache: &mut MatchCache,
    ) -> Vec<ScoredEntry> {
        let scorer = Scorer::new(&self.config);
        let mut scored = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let mut best: Option<ScoredEntry> = None;
            for (phrase_idx, phrase) in phrases.iter().enumerate() {
                let score = scorer.score(phrase, entry, cache);
                // earlier (longer) phrases win ties
                if score > best.as_ref().map_or(0.0, |b| b.score) {
                    best = Some(ScoredEntry {
                        index,
                        score,
                        phrase: phrase_idx,
                    });
                    if score >= EXACT_SCORE {
                        break;
                    }
                }
            }
            scored.extend(best);
        }
        scored
    }

    pub fn effective_threshold(&self, origin: SearchOrigin, phrase: &PreparedPhrase, entry: &IndexedEntry) -> f64 {
        let mut threshold = self.config.fuzzy_threshold * self.config.threshold_increase_multiplier;
        if origin == SearchOrigin::Auto {
            threshold *= self.config.auto_search_multiplier;
        }
        if phrase.is_single_word() && entry.source_word_count() > 1 {
            threshold *= self.config.single_word_long_entry_multiplier;
        }
        threshold
    }

    /// Entries sharing a configured punctuation mark with the query, as perfect matches.
    fn punctuation_matches(&self, query: &str, entries: &[IndexedEntry]) -> Vec<MatchCandidate> {
        let marks: Vec<&str> = self
            .config
            .punctuation_marks
            .iter()
            .map(String::as_str)
            .filter(|mark| !mark.is_empty() && query.contains(mark))
            .collect();
        if marks.is_empty() {
            return Vec::new();
        }

        entries
            .iter()
            .filter_map(|indexed| {
                let entry = &indexed.entry;
                marks
                    .iter()
                    .find(|mark| entry.source.contains(**mark) || entry.target.contains(**mark))
                    .map(|mark| MatchCandidate {
                        entry: entry.clone(),
                        score: EXACT_SCORE,
                        matched_phrase: (*mark).to_string(),
                    })
            })
            .collect()
    }
}

/// Exact first, then more specific phrases, then categorized entries, then score.
fn rank(matches: &mut [MatchCandidate]) {
    matches.sort_by(|a, b| {
        b.is_exact()
            .cmp(&a.is_exact())
            .then_with(|| b.phrase_word_count().cmp(&a.phrase_word_count()))
            .then_with(|| (!b.entry.category.is_empty()).cmp(&!a.entry.category.is_empty()))
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
    });
}
