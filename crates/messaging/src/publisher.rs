//! Event publishing capability.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::envelope::EventEnvelope;
use crate::error::PublishError;

/// Injected publishing capability.
///
/// The core never owns the broker connection; it is handed something
/// that can put an envelope on a topic under a partitioning key.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one envelope to `topic`, keyed by `key` so that
    /// events sharing a key preserve publish order.
    async fn publish(
        &self,
        topic: &str,
        key: OrderId,
        envelope: EventEnvelope,
    ) -> Result<(), PublishError>;
}

#[derive(Default)]
struct PublishedState {
    records: Vec<(String, OrderId, EventEnvelope)>,
    fail_next: u32,
}

/// In-memory publisher recording everything it is handed, for tests
/// and the default server wiring.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<RwLock<PublishedState>>,
}

impl InMemoryPublisher {
    /// Creates a new empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` publishes fail.
    pub async fn fail_next(&self, n: u32) {
        self.state.write().await.fail_next = n;
    }

    /// Returns all envelopes published to `topic`, in publish order.
    pub async fn published(&self, topic: &str) -> Vec<EventEnvelope> {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|(t, _, _)| t == topic)
            .map(|(_, _, e)| e.clone())
            .collect()
    }

    /// Returns all envelopes published to `topic` for one order.
    pub async fn published_for(&self, topic: &str, order_id: OrderId) -> Vec<EventEnvelope> {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|(t, key, _)| t == topic && *key == order_id)
            .map(|(_, _, e)| e.clone())
            .collect()
    }

    /// Returns the number of envelopes published to `topic`.
    pub async fn count(&self, topic: &str) -> usize {
        self.published(topic).await.len()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: OrderId,
        envelope: EventEnvelope,
    ) -> Result<(), PublishError> {
        let mut state = self.state.write().await;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(PublishError::Broker {
                topic: topic.to_string(),
                reason: "injected broker outage".to_string(),
            });
        }

        tracing::debug!(topic, %key, event_type = envelope.event_type(), "event published");
        state.records.push((topic.to_string(), key, envelope));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics;

    #[tokio::test]
    async fn test_records_by_topic_and_key() {
        let publisher = InMemoryPublisher::new();
        let order_a = OrderId::new();
        let order_b = OrderId::new();

        publisher
            .publish(
                topics::INVENTORY_EVENTS,
                order_a,
                EventEnvelope::inventory_outcome(order_a, "SKU-001".into(), 1, true, "ok"),
            )
            .await
            .unwrap();
        publisher
            .publish(
                topics::INVENTORY_EVENTS,
                order_b,
                EventEnvelope::inventory_outcome(order_b, "SKU-002".into(), 2, true, "ok"),
            )
            .await
            .unwrap();

        assert_eq!(publisher.count(topics::INVENTORY_EVENTS).await, 2);
        assert_eq!(publisher.count(topics::ORDER_EVENTS).await, 0);
        assert_eq!(
            publisher
                .published_for(topics::INVENTORY_EVENTS, order_a)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_fail_next() {
        let publisher = InMemoryPublisher::new();
        publisher.fail_next(1).await;
        let order_id = OrderId::new();

        let result = publisher
            .publish(
                topics::INVENTORY_EVENTS,
                order_id,
                EventEnvelope::inventory_outcome(order_id, "SKU-001".into(), 1, true, "ok"),
            )
            .await;
        assert!(matches!(result, Err(PublishError::Broker { .. })));
        assert_eq!(publisher.count(topics::INVENTORY_EVENTS).await, 0);
    }
}
