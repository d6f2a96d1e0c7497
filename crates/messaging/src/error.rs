//! Messaging error types.

use thiserror::Error;

/// Errors raised when publishing an event.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker rejected or failed to accept the event.
    #[error("publish to '{topic}' failed: {reason}")]
    Broker { topic: String, reason: String },
}

/// Classified failure of one delivery attempt.
///
/// The distinction drives the retry policy: transient faults are
/// retried with backoff, everything else goes straight to the
/// dead-letter path. Business outcomes never surface here; handlers
/// convert them into outcome events.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// Infrastructure fault worth retrying (store outage, timeout).
    #[error("transient failure: {0}")]
    Transient(String),

    /// Poison message or integrity fault; retrying cannot help.
    #[error("fatal failure: {0}")]
    Fatal(String),
}
