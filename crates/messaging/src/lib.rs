//! Event plumbing for the order fulfillment system.
//!
//! Defines the closed event variant set and its envelope, the
//! publishing capability injected into the core (the core never owns
//! the broker connection), idempotent-consumption support via the
//! deduplicator, and the consumer machinery: bounded retry with
//! exponential backoff and a dead-letter path for poison messages.

pub mod consumer;
pub mod dedup;
pub mod envelope;
pub mod error;
pub mod publisher;
pub mod topics;

pub use consumer::{ConsumerWorker, DeadLetter, DeadLetterQueue, Delivery, EventHandler, RetryPolicy};
pub use dedup::{Deduplicator, InMemoryDeduplicator};
pub use envelope::{
    EventEnvelope, EventKind, InventoryOutcomeData, OrderSubmittedData, PaymentOutcomeData,
    ReleaseData,
};
pub use error::{ConsumeError, PublishError};
pub use publisher::{EventPublisher, InMemoryPublisher};
