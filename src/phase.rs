//! Per-search state machine:
//! Idle → Decomposing → Scoring → Thresholding → Deduping → Ranking → Done.
//! Empty queries or glossaries go straight from Idle to Done.

use std::time::Instant;

use serde::Serialize;
use tracing::{trace, warn};

use crate::metrics::{Metric, MetricsRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SearchPhase {
    Idle,
    Decomposing,
    Scoring,
    Thresholding,
    Deduping,
    Ranking,
    Done,
}

impl std::fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchPhase::Idle => write!(f, "Idle"),
            SearchPhase::Decomposing => write!(f, "Decomposing"),
            SearchPhase::Scoring => write!(f, "Scoring"),
            SearchPhase::Thresholding => write!(f, "Thresholding"),
            SearchPhase::Deduping => write!(f, "Deduping"),
            SearchPhase::Ranking => write!(f, "Ranking"),
            SearchPhase::Done => write!(f, "Done"),
        }
    }
}

impl SearchPhase {
    /// Returns whether transitioning from `self` to `next` is valid.
    pub fn can_transition_to(self, next: SearchPhase) -> bool {
        matches!(
            (self, next),
            (SearchPhase::Idle, SearchPhase::Decomposing)
                | (SearchPhase::Idle, SearchPhase::Done) // nothing to match
                | (SearchPhase::Decomposing, SearchPhase::Scoring)
                | (SearchPhase::Scoring, SearchPhase::Thresholding)
                | (SearchPhase::Thresholding, SearchPhase::Deduping)
                | (SearchPhase::Deduping, SearchPhase::Ranking)
                | (SearchPhase::Ranking, SearchPhase::Done)
        )
    }

    fn metric(self) -> Option<Metric> {
        match self {
            SearchPhase::Decomposing => Some(Metric::Decomposing),
            SearchPhase::Scoring => Some(Metric::Scoring),
            SearchPhase::Thresholding => Some(Metric::Thresholding),
            SearchPhase::Deduping => Some(Metric::Deduping),
            SearchPhase::Ranking => Some(Metric::Ranking),
            SearchPhase::Idle | SearchPhase::Done => None,
        }
    }
}

/// Walks one search through its phases, timing each into the registry.
pub struct PhaseTracker<'a> {
    phase: SearchPhase,
    started: Instant,
    entered: Instant,
    metrics: &'a MetricsRegistry,
}

impl<'a> PhaseTracker<'a> {
    pub fn new(metrics: &'a MetricsRegistry) -> Self {
        let now = Instant::now();
        Self {
            phase: SearchPhase::Idle,
            started: now,
            entered: now,
            metrics,
        }
    }

    pub fn current(&self) -> SearchPhase {
        self.phase
    }

    /// Move to `next`. Invalid transitions are logged and ignored.
    pub fn advance(&mut self, next: SearchPhase) -> bool {
        let current = self.phase;
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "invalid search phase transition");
            return false;
        }

        let now = Instant::now();
        if let Some(metric) = current.metric() {
            self.metrics.record(metric, now.duration_since(self.entered));
        }
        if next == SearchPhase::Done {
            self.metrics.record(Metric::Search, now.duration_since(self.started));
        }

        self.phase = next;
        self.entered = now;
        trace!(from = %current, to = %next, "search_phase");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pipeline_is_valid() {
        let metrics = MetricsRegistry::new();
        let mut tracker = PhaseTracker::new(&metrics);
        for next in [
            SearchPhase::Decomposing,
            SearchPhase::Scoring,
            SearchPhase::Thresholding,
            SearchPhase::Deduping,
            SearchPhase::Ranking,
            SearchPhase::Done,
        ] {
            assert!(tracker.advance(next), "rejected {next}");
        }
        assert_eq!(tracker.current(), SearchPhase::Done);
        assert_eq!(metrics.sample_count(Metric::Search), 1);
        assert_eq!(metrics.sample_count(Metric::Ranking), 1);
    }

    #[test]
    fn skipping_phases_is_rejected() {
        let metrics = MetricsRegistry::new();
        let mut tracker = PhaseTracker::new(&metrics);
        assert!(!tracker.advance(SearchPhase::Scoring));
        assert_eq!(tracker.current(), SearchPhase::Idle);
        assert!(tracker.advance(SearchPhase::Done));
        assert!(!tracker.advance(SearchPhase::Decomposing));
        assert_eq!(metrics.sample_count(Metric::Decomposing), 0);
    }
}
