//! Memoization of phrase decompositions and similarity scores.
//! Similarity key: blake3 hash of the order-normalized string pair.
//! Both maps are flushed wholesale once they exceed their cap; no LRU.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::MatchConfig;

use super::phrases::generate_phrases;
use super::similarity::similarity;

pub struct MatchCache {
    phrases: HashMap<String, Arc<[String]>>,
    similarities: HashMap<[u8; 32], f64>,
    phrase_cap: usize,
    similarity_cap: usize,
}

/// Entry counts at the time of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStats {
    pub phrase_entries: usize,
    pub similarity_entries: usize,
}

impl MatchCache {
    pub fn new(phrase_cap: usize, similarity_cap: usize) -> Self {
        Self {
            phrases: HashMap::new(),
            similarities: HashMap::new(),
            phrase_cap,
            similarity_cap,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.phrase_cache_cap, config.similarity_cache_cap)
    }

    /// Similarity is symmetric, so (a, b) and (b, a) share a key.
    pub fn compute_key(a: &str, b: &str) -> [u8; 32] {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(first.len() as u64).to_le_bytes());
        hasher.update(first.as_bytes());
        hasher.update(b"|");
        hasher.update(second.as_bytes());
        *hasher.finalize().as_bytes()
    }

    pub fn similarity(&mut self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let key = Self::compute_key(a, b);
        *self
            .similarities
            .entry(key)
            .or_insert_with(|| similarity(a, b))
    }

    /// Phrase decomposition of `text`, memoized by the literal input string.
    pub fn phrases(&mut self, config: &MatchConfig, text: &str) -> Arc<[String]> {
        if let Some(cached) = self.phrases.get(text) {
            return Arc::clone(cached);
        }
        let phrases: Arc<[String]> = generate_phrases(config, text).into();
        self.phrases.insert(text.to_string(), Arc::clone(&phrases));
        phrases
    }

    /// Clear any cache that has grown past its cap. Returns true if anything was flushed.
    pub fn enforce_caps(&mut self) -> bool {
        let mut flushed = false;
        if self.phrases.len() > self.phrase_cap {
            debug!(entries = self.phrases.len(), cap = self.phrase_cap, "phrase cache flushed");
            self.phrases.clear();
            flushed = true;
        }
        if self.similarities.len() > self.similarity_cap {
            debug!(
                entries = self.similarities.len(),
                cap = self.similarity_cap,
                "similarity cache flushed"
            );
            self.similarities.clear();
            flushed = true;
        }
        flushed
    }

    pub fn clear(&mut self) {
        self.phrases.clear();
        self.similarities.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            phrase_entries: self.phrases.len(),
            similarity_entries: self.similarities.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_order_independent() {
        assert_eq!(MatchCache::compute_key("rank", "ranks"), MatchCache::compute_key("ranks", "rank"));
        assert_ne!(MatchCache::compute_key("ab", "c"), MatchCache::compute_key("a", "bc"));
    }

    #[test]
    fn memoizes_similarity() {
        let mut cache = MatchCache::new(10, 10);
        let first = cache.similarity("avatar", "avatars");
        let second = cache.similarity("avatars", "avatar");
        assert_eq!(first, second);
        assert_eq!(cache.stats().similarity_entries, 1);
        assert_eq!(cache.similarity("", "avatar"), 0.0);
        assert_eq!(cache.stats().similarity_entries, 1);
    }

    #[test]
    fn memoizes_phrases_by_literal_text() {
        let config = MatchConfig::default();
        let mut cache = MatchCache::from_config(&config);
        let a = cache.phrases(&config, "avatar performance");
        let b = cache.phrases(&config, "avatar performance");
        assert!(Arc::ptr_eq(&a, &b));
        cache.phrases(&config, "avatar  performance");
        assert_eq!(cache.stats().phrase_entries, 2);
    }

    #[test]
    fn flushes_whole_cache_past_cap() {
        let config = MatchConfig::default();
        let mut cache = MatchCache::new(2, 100);
        for text in ["alpha", "bravo", "charlie"] {
            cache.phrases(&config, text);
        }
        cache.similarity("alpha", "bravo");

        assert!(cache.enforce_caps());
        assert_eq!(
            cache.stats(),
            CacheStats {
                phrase_entries: 0,
                similarity_entries: 1
            }
        );
        assert!(!cache.enforce_caps());
    }
}
