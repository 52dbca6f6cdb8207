//! Search latency tracking.
//! Each metric keeps a window of its most recent durations; snapshots
//! report p50/p95/p99 over that window.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// What a latency sample measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// One `search` call, Idle to Done.
    Search,
    Decomposing,
    Scoring,
    Thresholding,
    Deduping,
    Ranking,
    /// Settled text to delivered (or dropped) auto-search result.
    AutoSearchCycle,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Search,
        Metric::Decomposing,
        Metric::Scoring,
        Metric::Thresholding,
        Metric::Deduping,
        Metric::Ranking,
        Metric::AutoSearchCycle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Search => "search_total",
            Metric::Decomposing => "phase_decomposing",
            Metric::Scoring => "phase_scoring",
            Metric::Thresholding => "phase_thresholding",
            Metric::Deduping => "phase_deduping",
            Metric::Ranking => "phase_ranking",
            Metric::AutoSearchCycle => "auto_search_cycle",
        }
    }
}

/// Most recent samples for one metric, oldest evicted first.
struct LatencyWindow {
    recent: VecDeque<Duration>,
    limit: usize,
}

impl LatencyWindow {
    fn new(limit: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(limit),
            limit,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.recent.len() == self.limit {
            self.recent.pop_front();
        }
        self.recent.push_back(sample);
    }

    /// Nearest-rank quantile, `q` in [0, 1].
    fn quantile(&self, q: f64) -> Duration {
        let mut sorted: Vec<Duration> = self.recent.iter().copied().collect();
        sorted.sort_unstable();
        match sorted.len() {
            0 => Duration::ZERO,
            n => sorted[((q.clamp(0.0, 1.0) * (n - 1) as f64).round() as usize).min(n - 1)],
        }
    }
}

pub struct MetricsRegistry {
    windows: Mutex<HashMap<Metric, LatencyWindow>>,
    window_len: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_window(1024)
    }

    /// Keep at most `window_len` samples per metric.
    pub fn with_window(window_len: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_len: window_len.max(1),
        }
    }

    pub fn record(&self, metric: Metric, elapsed: Duration) {
        self.windows
            .lock()
            .entry(metric)
            .or_insert_with(|| LatencyWindow::new(self.window_len))
            .push(elapsed);
        tracing::trace!(metric = metric.as_str(), elapsed_us = elapsed.as_micros() as u64, "latency");
    }

    /// Start timing `metric`; the sample lands when the stopwatch is stopped.
    pub fn start(self: &Arc<Self>, metric: Metric) -> Stopwatch {
        Stopwatch {
            metric,
            started: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    /// Samples currently held for `metric`.
    pub fn sample_count(&self, metric: Metric) -> usize {
        self.windows.lock().get(&metric).map_or(0, |w| w.recent.len())
    }

    pub fn quantile(&self, metric: Metric, q: f64) -> Duration {
        self.windows
            .lock()
            .get(&metric)
            .map_or(Duration::ZERO, |w| w.quantile(q))
    }

    /// One summary per metric that has samples, in `Metric::ALL` order.
    pub fn snapshot(&self) -> Vec<LatencySummary> {
        let windows = self.windows.lock();
        Metric::ALL
            .iter()
            .filter_map(|metric| {
                let window = windows.get(metric)?;
                let us = |q| window.quantile(q).as_micros() as u64;
                Some(LatencySummary {
                    metric: *metric,
                    samples: window.recent.len(),
                    p50_us: us(0.50),
                    p95_us: us(0.95),
                    p99_us: us(0.99),
                })
            })
            .collect()
    }
}

/// Records its elapsed time into the registry when stopped.
pub struct Stopwatch {
    metric: Metric,
    started: Instant,
    registry: Arc<MetricsRegistry>,
}

impl Stopwatch {
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.registry.record(self.metric, elapsed);
        elapsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub metric: Metric,
    pub samples: usize,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn window_evicts_oldest() {
        let registry = MetricsRegistry::with_window(4);
        for n in [10, 20, 30, 40, 50] {
            registry.record(Metric::Search, ms(n));
        }
        assert_eq!(registry.sample_count(Metric::Search), 4);
        assert_eq!(registry.quantile(Metric::Search, 0.0), ms(20));
        assert_eq!(registry.quantile(Metric::Search, 1.0), ms(50));
        assert_eq!(registry.quantile(Metric::Scoring, 0.5), Duration::ZERO);
    }

    #[test]
    fn snapshot_lists_only_recorded_metrics_in_order() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.record(Metric::Ranking, ms(2));
        let watch = registry.start(Metric::Search);
        assert_eq!(registry.sample_count(Metric::Search), 0);
        watch.stop();

        let snapshot = registry.snapshot();
        let metrics: Vec<Metric> = snapshot.iter().map(|s| s.metric).collect();
        assert_eq!(metrics, vec![Metric::Search, Metric::Ranking]);
        assert_eq!(snapshot[1].p50_us, 2000);
        assert_eq!(snapshot[1].samples, 1);
    }
}
