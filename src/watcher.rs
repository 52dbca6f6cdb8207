//! Auto search: the caller-side scheduling loop around the matcher.
//! Waits for the editor text to change, lets it settle, skips empty or
//! already-searched text, then runs one `Auto` search per settled change.
//! Results for a superseded generation are dropped, never delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::generation::SearchGeneration;
use crate::matching::{GlossaryMatcher, MatchCandidate, SearchOrigin};
use crate::metrics::Metric;

/// Default settle interval before an edited text is searched.
pub const AUTO_SEARCH_SETTLE_MS: u64 = 1500;

#[derive(Debug, Clone)]
pub struct AutoSearchUpdate {
    pub request_id: String,
    pub generation: u64,
    pub text: String,
    pub matches: Vec<MatchCandidate>,
}

pub struct AutoSearcher {
    matcher: Arc<GlossaryMatcher>,
    generations: Arc<SearchGeneration>,
    settle: Duration,
}

impl AutoSearcher {
    /// `generations` may be shared with the manual search path so that a
    /// manual search supersedes a pending auto search.
    pub fn new(matcher: Arc<GlossaryMatcher>, generations: Arc<SearchGeneration>, settle: Duration) -> Self {
        Self {
            matcher,
            generations,
            settle,
        }
    }

    /// Run until `cancel` fires, the text sender is dropped, or the update
    /// receiver goes away.
    pub async fn run(
        self,
        mut text_rx: watch::Receiver<String>,
        updates: mpsc::UnboundedSender<AutoSearchUpdate>,
        cancel: CancellationToken,
    ) {
        info!(settle_ms = self.settle.as_millis() as u64, "auto search loop started");
        let mut last_searched = String::new();

        while self.wait_for_settled(&mut text_rx, &cancel).await {
            let text = text_rx.borrow().trim().to_string();
            if text.is_empty() || text == last_searched {
                continue;
            }
            last_searched = text.clone();

            let ticket = self.generations.advance();
            let request_id = uuid::Uuid::new_v4().to_string();
            let stopwatch = self.matcher.metrics().start(Metric::AutoSearchCycle);

            let matcher = Arc::clone(&self.matcher);
            let query = text.clone();
            let search = tokio::task::spawn_blocking(move || matcher.search(&query, SearchOrigin::Auto));
            let result = tokio::select! {
                result = search => Some(result),
                _ = ticket.superseded() => None,
            };
            let elapsed = stopwatch.stop();

            let matches = match result {
                Some(Ok(matches)) if ticket.should_publish() => matches,
                Some(Err(e)) => {
                    error!(error = %e, "auto search task panicked");
                    break;
                }
                _ => {
                    debug!(generation = ticket.generation(), "stale auto search dropped");
                    continue;
                }
            };

            debug!(
                request_id = %request_id,
                generation = ticket.generation(),
                matches = matches.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "auto search"
            );
            let update = AutoSearchUpdate {
                request_id,
                generation: ticket.generation(),
                text,
                matches,
            };
            if updates.send(update).is_err() {
                debug!("auto search receiver dropped");
                break;
            }
        }

        info!("auto search loop stopped");
    }

    /// Wait for a change, then until no further change arrives for the
    /// settle interval. Returns false when the loop should stop.
    async fn wait_for_settled(&self, text_rx: &mut watch::Receiver<String>, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            changed = text_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.settle) => return true,
                changed = text_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}
