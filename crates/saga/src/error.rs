//! Saga error types.

use common::OrderId;
use domain::{OrderError, StoreError};
use ledger::LedgerError;
use messaging::{ConsumeError, PublishError};
use thiserror::Error;

/// Errors that can occur while driving a saga.
///
/// Business outcomes (insufficient stock, unknown product) never
/// appear here; they are converted into outcome events inside the
/// coordinator. What remains is either infrastructure trouble or a
/// poison message.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The referenced order does not exist in the order store.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order aggregate rejected a transition.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// The stock ledger failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The order store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Publishing an outcome event failed.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}

impl SagaError {
    /// Returns true for faults worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            SagaError::Ledger(e) => e.is_transient(),
            SagaError::Store(StoreError::Transient(_)) => true,
            SagaError::Publish(_) => true,
            SagaError::OrderNotFound(_) | SagaError::Order(_) => false,
        }
    }
}

impl From<SagaError> for ConsumeError {
    fn from(err: SagaError) -> Self {
        if err.is_transient() {
            ConsumeError::Transient(err.to_string())
        } else {
            ConsumeError::Fatal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SagaError::Ledger(LedgerError::Transient("outage".into())).is_transient());
        assert!(SagaError::Store(StoreError::Transient("outage".into())).is_transient());
        assert!(!SagaError::OrderNotFound(OrderId::new()).is_transient());
        assert!(
            !SagaError::Ledger(LedgerError::ProductNotFound("SKU-404".into())).is_transient()
        );
    }

    #[test]
    fn test_consume_error_mapping() {
        let err: ConsumeError = SagaError::Ledger(LedgerError::Transient("outage".into())).into();
        assert!(matches!(err, ConsumeError::Transient(_)));

        let err: ConsumeError = SagaError::OrderNotFound(OrderId::new()).into();
        assert!(matches!(err, ConsumeError::Fatal(_)));
    }
}
