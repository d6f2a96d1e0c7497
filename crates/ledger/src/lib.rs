//! Per-product stock ledger.
//!
//! The ledger is the only mutable shared resource crossing order
//! boundaries: multiple orders may reserve against the same product.
//! Mutation is serialized per product ID, never behind a process-wide
//! lock, so unrelated products reserve in parallel.

pub mod error;
pub mod memory;
pub mod stock;

use async_trait::async_trait;
use domain::ProductId;

pub use error::LedgerError;
pub use memory::InMemoryStockLedger;
pub use stock::StockItem;

/// Business outcome of a reservation attempt.
///
/// These are expected outcomes, not faults: insufficient stock and an
/// unknown product drive the compensation path rather than a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock was moved from available to reserved.
    Reserved,

    /// Not enough available stock to cover the request.
    InsufficientStock { available: u32, requested: u32 },

    /// The product is not registered in the ledger.
    ProductNotFound,
}

impl ReserveOutcome {
    /// Returns true when stock was actually reserved.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved)
    }
}

/// Contract for the stock ledger.
///
/// `try_reserve` must be atomic with respect to concurrent calls on
/// the same product: two concurrent reservations can never both
/// succeed when only one has sufficient stock. Callers must not assume
/// success until the call returns.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Attempts to move `quantity` units from available to reserved.
    async fn try_reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ReserveOutcome, LedgerError>;

    /// Moves `quantity` units from reserved back to available.
    ///
    /// Releasing more than is currently reserved is a data-integrity
    /// fault (`LedgerError::OverRelease`), reported and never clamped.
    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), LedgerError>;

    /// Increases available stock. This is the only operation that
    /// changes a product's conserved `available + reserved` sum.
    async fn restock(&self, product_id: &ProductId, quantity: u32) -> Result<(), LedgerError>;

    /// Registers a new product with its initial stock.
    async fn register(&self, item: StockItem) -> Result<(), LedgerError>;

    /// Looks up a product's counters.
    async fn get(&self, product_id: &ProductId) -> Result<Option<StockItem>, LedgerError>;

    /// Returns all registered products.
    async fn list(&self) -> Result<Vec<StockItem>, LedgerError>;
}
