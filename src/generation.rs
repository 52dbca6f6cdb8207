//! Supersession of in-flight searches.
//! Issuing a ticket for a new request cancels the previous ticket's token
//! and bumps the shared generation counter; a ticket whose generation is
//! no longer the latest must not publish its results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct SearchGeneration {
    latest: Arc<AtomicU64>,
    in_flight: Mutex<CancellationToken>,
}

impl SearchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede whatever is in flight and hand out a ticket for the next request.
    pub fn advance(&self) -> SearchTicket {
        let mut in_flight = self.in_flight.lock();
        in_flight.cancel();
        *in_flight = CancellationToken::new();
        SearchTicket {
            generation: self.latest.fetch_add(1, Ordering::SeqCst) + 1,
            latest: Arc::clone(&self.latest),
            cancel: in_flight.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Abandon the in-flight request without starting another.
    pub fn cancel_all(&self) {
        self.in_flight.lock().cancel();
    }
}

/// Held by one request and checked before it delivers anything.
#[derive(Clone)]
pub struct SearchTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn should_publish(&self) -> bool {
        self.is_current() && !self.is_cancelled()
    }

    /// Resolves once this request has been superseded or abandoned.
    pub async fn superseded(&self) {
        self.cancel.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_request_supersedes_older() {
        let generations = SearchGeneration::new();
        let first = generations.advance();
        assert!(first.should_publish());
        assert_eq!(first.generation(), 1);

        let second = generations.advance();
        assert!(!first.is_current());
        assert!(first.is_cancelled());
        assert!(second.should_publish());
        assert_eq!(generations.current(), 2);
    }

    #[test]
    fn cancel_all_keeps_generation() {
        let generations = SearchGeneration::new();
        let ticket = generations.advance();
        generations.cancel_all();
        assert!(ticket.is_current());
        assert!(!ticket.should_publish());
    }

    #[tokio::test]
    async fn superseded_resolves_on_advance() {
        let generations = SearchGeneration::new();
        let first = generations.advance();
        let waiter = tokio::spawn(async move { first.superseded().await });
        generations.advance();
        tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
