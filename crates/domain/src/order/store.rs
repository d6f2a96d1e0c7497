//! Order store boundary.
//!
//! The persistent engine behind order lookups is external to the core;
//! it is modeled here as a key-value store with get/put/scan-by-field
//! semantics. The in-memory implementation backs the tests and the
//! default server wiring.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::value_objects::CustomerId;

use super::Order;

/// Errors raised by an order store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend was unavailable or timed out. Callers retry with
    /// backoff and dead-letter after exhausting the retry budget.
    #[error("transient store error: {0}")]
    Transient(String),
}

/// Key-value boundary for order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Looks up an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Inserts or replaces an order record.
    async fn put(&self, order: Order) -> Result<(), StoreError>;

    /// Scans for all orders belonging to a customer.
    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, StoreError>;

    /// Returns all orders.
    async fn list(&self) -> Result<Vec<Order>, StoreError>;
}

#[derive(Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    fail_next: u32,
}

/// In-memory order store for tests and the default server wiring.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` operations fail with a transient error.
    pub async fn fail_next(&self, n: u32) {
        self.state.write().await.fail_next = n;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    async fn check_fault(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(StoreError::Transient("injected store outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.check_fault().await?;
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn put(&self, order: Order) -> Result<(), StoreError> {
        self.check_fault().await?;
        self.state.write().await.orders.insert(order.id(), order);
        Ok(())
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, StoreError> {
        self.check_fault().await?;
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        self.check_fault().await?;
        Ok(self.state.read().await.orders.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{LineItem, Money};

    fn order_for(customer_id: CustomerId) -> Order {
        Order::new(
            OrderId::new(),
            customer_id,
            vec![LineItem::new("SKU-001", 1)],
            Money::from_cents(1000),
            "1 Main St",
            "credit_card",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryOrderStore::new();
        let order = order_for(CustomerId::new());
        let id = order.id();

        store.put(order).await.unwrap();
        let found = store.get(id).await.unwrap().unwrap();
        assert_eq!(found.id(), id);

        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_customer() {
        let store = InMemoryOrderStore::new();
        let customer = CustomerId::new();

        store.put(order_for(customer)).await.unwrap();
        store.put(order_for(customer)).await.unwrap();
        store.put(order_for(CustomerId::new())).await.unwrap();

        let found = store.find_by_customer(customer).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = InMemoryOrderStore::new();
        store.fail_next(1).await;

        let err = store.get(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Transient(_)));

        // The fault budget is consumed; the next call succeeds.
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }
}
