//! Ledger error types.

use domain::ProductId;
use thiserror::Error;

/// Errors raised by stock ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The product is not registered in the ledger.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product id is already registered. Replacing an entry would
    /// reset its reserved counter while orders still hold that stock.
    #[error("product already registered: {0}")]
    AlreadyRegistered(ProductId),

    /// An attempt to release more stock than is currently reserved.
    /// Indicates a coordination bug, never silently clamped.
    #[error("over-release for product {product_id}: reserved {reserved}, requested {requested}")]
    OverRelease {
        product_id: ProductId,
        reserved: u32,
        requested: u32,
    },

    /// The backing store was unavailable or timed out. Retried with
    /// backoff; dead-lettered after the retry budget is exhausted.
    #[error("transient ledger error: {0}")]
    Transient(String),
}

impl LedgerError {
    /// Returns true for faults worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}
