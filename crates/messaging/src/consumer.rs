//! Consumer machinery: retry with backoff and the dead-letter path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::envelope::EventEnvelope;
use crate::error::ConsumeError;

/// A consumer of envelopes from one or more channels.
///
/// Handlers convert business outcomes into outcome events and never
/// surface them as errors; only infrastructure faults and poison
/// messages come back through `ConsumeError`.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable consumer name, used for logging and dead-letter records.
    fn consumer_name(&self) -> &'static str;

    /// Processes one delivery.
    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ConsumeError>;
}

/// Bounded exponential backoff for transient faults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total delivery attempts before dead-lettering.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Returns the delay before the given retry (1-based attempt that
    /// just failed), exponentially grown and capped.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exp = failed_attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// A message that exhausted its retry budget or was poison on arrival.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub consumer: &'static str,
    pub envelope: EventEnvelope,
    pub attempts: u32,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Terminal destination for undeliverable messages. Never silently
/// discards: everything routed here stays queryable.
#[derive(Clone, Default)]
pub struct DeadLetterQueue {
    entries: Arc<RwLock<Vec<DeadLetter>>>,
}

impl DeadLetterQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a dead letter.
    pub async fn push(&self, letter: DeadLetter) {
        metrics::counter!("dead_letters_total").increment(1);
        tracing::error!(
            consumer = letter.consumer,
            event_id = %letter.envelope.event_id,
            event_type = letter.envelope.event_type(),
            attempts = letter.attempts,
            reason = %letter.reason,
            "message dead-lettered"
        );
        self.entries.write().await.push(letter);
    }

    /// Returns the number of dead letters.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true when the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns a snapshot of all dead letters.
    pub async fn entries(&self) -> Vec<DeadLetter> {
        self.entries.read().await.clone()
    }
}

/// Result of delivering one envelope through a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The handler processed the envelope.
    Handled,
    /// The envelope was routed to the dead-letter queue.
    DeadLettered,
}

/// Drives one handler with the retry policy and dead-letter routing.
///
/// Transient faults are retried with exponential backoff up to the
/// attempt cap; fatal faults short-circuit to the dead-letter queue.
pub struct ConsumerWorker<H> {
    handler: H,
    policy: RetryPolicy,
    dead_letters: DeadLetterQueue,
}

impl<H: EventHandler> ConsumerWorker<H> {
    /// Creates a worker around a handler.
    pub fn new(handler: H, policy: RetryPolicy, dead_letters: DeadLetterQueue) -> Self {
        Self {
            handler,
            policy,
            dead_letters,
        }
    }

    /// Returns the wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Delivers one envelope, retrying transient faults.
    #[tracing::instrument(
        skip(self, envelope),
        fields(consumer = self.handler.consumer_name(), event_id = %envelope.event_id)
    )]
    pub async fn deliver(&self, envelope: &EventEnvelope) -> Delivery {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.handler.handle(envelope).await {
                Ok(()) => {
                    metrics::counter!("events_consumed_total").increment(1);
                    return Delivery::Handled;
                }
                Err(ConsumeError::Transient(reason)) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(ConsumeError::Transient(reason)) => {
                    self.dead_letter(envelope, attempt, format!("retry budget exhausted: {reason}"))
                        .await;
                    return Delivery::DeadLettered;
                }
                Err(ConsumeError::Fatal(reason)) => {
                    self.dead_letter(envelope, attempt, reason).await;
                    return Delivery::DeadLettered;
                }
            }
        }
    }

    async fn dead_letter(&self, envelope: &EventEnvelope, attempts: u32, reason: String) {
        self.dead_letters
            .push(DeadLetter {
                consumer: self.handler.consumer_name(),
                envelope: envelope.clone(),
                attempts,
                reason,
                failed_at: Utc::now(),
            })
            .await;
    }
}
