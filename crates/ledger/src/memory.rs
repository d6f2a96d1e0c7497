//! In-memory stock ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use domain::ProductId;

use crate::error::LedgerError;
use crate::stock::StockItem;
use crate::{ReserveOutcome, StockLedger};

/// In-memory stock ledger with per-product locking.
///
/// Each product's counters live behind their own mutex, held only for
/// the duration of one counter move; the outer map lock covers
/// membership only. Two orders touching different products never
/// contend.
#[derive(Clone, Default)]
pub struct InMemoryStockLedger {
    products: Arc<RwLock<HashMap<ProductId, Arc<Mutex<StockItem>>>>>,
    fail_next: Arc<AtomicU32>,
}

impl InMemoryStockLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` ledger operations fail with a transient
    /// error, simulating a storage outage.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    fn check_fault(&self) -> Result<(), LedgerError> {
        let consumed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(LedgerError::Transient(
                "injected storage outage".to_string(),
            ));
        }
        Ok(())
    }

    fn entry(&self, product_id: &ProductId) -> Option<Arc<Mutex<StockItem>>> {
        self.products
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(product_id)
            .cloned()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    #[tracing::instrument(skip(self), fields(product = %product_id))]
    async fn try_reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ReserveOutcome, LedgerError> {
        self.check_fault()?;

        let Some(entry) = self.entry(product_id) else {
            return Ok(ReserveOutcome::ProductNotFound);
        };

        let mut item = entry.lock().unwrap_or_else(|e| e.into_inner());
        if !item.has_available(quantity) {
            metrics::counter!("stock_reservation_conflicts_total").increment(1);
            tracing::warn!(
                available = item.available,
                requested = quantity,
                "insufficient stock"
            );
            return Ok(ReserveOutcome::InsufficientStock {
                available: item.available,
                requested: quantity,
            });
        }

        item.reserve(quantity);
        metrics::counter!("stock_reservations_total").increment(1);
        tracing::debug!(
            available = item.available,
            reserved = item.reserved,
            "stock reserved"
        );
        Ok(ReserveOutcome::Reserved)
    }

    #[tracing::instrument(skip(self), fields(product = %product_id))]
    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), LedgerError> {
        self.check_fault()?;

        let entry = self
            .entry(product_id)
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))?;

        let mut item = entry.lock().unwrap_or_else(|e| e.into_inner());
        let reserved = item.reserved;
        if !item.release(quantity) {
            metrics::counter!("stock_over_releases_total").increment(1);
            tracing::error!(reserved, requested = quantity, "over-release detected");
            return Err(LedgerError::OverRelease {
                product_id: product_id.clone(),
                reserved,
                requested: quantity,
            });
        }

        metrics::counter!("stock_releases_total").increment(1);
        tracing::debug!(
            available = item.available,
            reserved = item.reserved,
            "stock released"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(product = %product_id))]
    async fn restock(&self, product_id: &ProductId, quantity: u32) -> Result<(), LedgerError> {
        self.check_fault()?;

        let entry = self
            .entry(product_id)
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))?;

        let mut item = entry.lock().unwrap_or_else(|e| e.into_inner());
        item.restock(quantity);
        tracing::info!(available = item.available, "stock replenished");
        Ok(())
    }

    async fn register(&self, item: StockItem) -> Result<(), LedgerError> {
        self.check_fault()?;
        let mut products = self.products.write().unwrap_or_else(|e| e.into_inner());
        if products.contains_key(&item.product_id) {
            return Err(LedgerError::AlreadyRegistered(item.product_id));
        }
        products.insert(item.product_id.clone(), Arc::new(Mutex::new(item)));
        Ok(())
    }

    async fn get(&self, product_id: &ProductId) -> Result<Option<StockItem>, LedgerError> {
        self.check_fault()?;
        Ok(self
            .entry(product_id)
            .map(|entry| entry.lock().unwrap_or_else(|e| e.into_inner()).clone()))
    }

    async fn list(&self) -> Result<Vec<StockItem>, LedgerError> {
        self.check_fault()?;
        let products = self.products.read().unwrap_or_else(|e| e.into_inner());
        Ok(products
            .values()
            .map(|entry| entry.lock().unwrap_or_else(|e| e.into_inner()).clone())
            .collect())
    }
}
