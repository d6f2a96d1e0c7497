//! Idempotent-consumption support.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::EventId;

/// Tracks processed event IDs for one consumer so at-least-once
/// redeliveries are absorbed instead of reprocessed.
///
/// Queries and updates must be atomic relative to concurrent
/// deliveries of the same event ID.
#[async_trait]
pub trait Deduplicator: Send + Sync {
    /// Returns true if the event was already processed.
    async fn seen(&self, event_id: EventId) -> bool;

    /// Records the event as processed.
    async fn mark_seen(&self, event_id: EventId);
}

/// In-memory deduplicator with a bounded retention window.
///
/// Entries expire after `retention`, which must be at least as long as
/// the broker's maximum redelivery delay: an entry expiring while the
/// broker can still redeliver its event re-opens the door to double
/// processing. That trade-off bounds memory instead of growing the set
/// forever; the default window of 24 hours comfortably exceeds typical
/// redelivery horizons.
#[derive(Clone)]
pub struct InMemoryDeduplicator {
    entries: Arc<Mutex<HashMap<EventId, Instant>>>,
    retention: Duration,
}

impl InMemoryDeduplicator {
    /// Creates a deduplicator with the default 24 hour retention.
    pub fn new() -> Self {
        Self::with_retention(Duration::from_secs(24 * 60 * 60))
    }

    /// Creates a deduplicator with an explicit retention window.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true when no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(entries: &mut HashMap<EventId, Instant>, retention: Duration) {
        let now = Instant::now();
        entries.retain(|_, recorded| now.duration_since(*recorded) < retention);
    }
}

impl Default for InMemoryDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Deduplicator for InMemoryDeduplicator {
    async fn seen(&self, event_id: EventId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Self::purge_expired(&mut entries, self.retention);
        entries.contains_key(&event_id)
    }

    async fn mark_seen(&self, event_id: EventId) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Self::purge_expired(&mut entries, self.retention);
        entries.insert(event_id, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_then_seen() {
        let dedup = InMemoryDeduplicator::new();
        let id = EventId::new();

        assert!(!dedup.seen(id).await);
        dedup.mark_seen(id).await;
        assert!(dedup.seen(id).await);
        assert!(!dedup.seen(EventId::new()).await);
    }

    #[tokio::test]
    async fn test_entries_expire_after_retention() {
        let dedup = InMemoryDeduplicator::with_retention(Duration::from_millis(20));
        let id = EventId::new();

        dedup.mark_seen(id).await;
        assert!(dedup.seen(id).await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!dedup.seen(id).await);
        assert!(dedup.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_marks_of_same_id_converge() {
        let dedup = InMemoryDeduplicator::new();
        let id = EventId::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dedup = dedup.clone();
            handles.push(tokio::spawn(async move { dedup.mark_seen(id).await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(dedup.seen(id).await);
        assert_eq!(dedup.len(), 1);
    }
}
