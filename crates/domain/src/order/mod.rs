//! Order aggregate.

pub mod status;
pub mod store;

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{CustomerId, LineItem, Money};
use status::OrderStatus;

/// Errors raised by the order aggregate.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested transition is not allowed from the current status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: &'static str,
    },

    /// An order must carry at least one line item.
    #[error("order has no line items")]
    NoItems,

    /// Line item quantities must be positive.
    #[error("zero quantity for product {product_id}")]
    ZeroQuantity { product_id: String },
}

/// An order and its reservation lifecycle.
///
/// Status is mutated exclusively through the transition methods below,
/// so that every order that enters the saga reaches exactly one
/// terminal status. `reservation_progress` records which line items
/// have been reserved in the current pass; it is what makes a crashed
/// `Reserving` pass recoverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<LineItem>,
    total_amount: Money,
    shipping_address: String,
    payment_method: String,
    status: OrderStatus,
    /// Items reserved so far in the current reservation pass, in
    /// reservation order. Cleared when the reservation settles.
    reservation_progress: Vec<LineItem>,
    /// Reason the order failed or was cancelled, if it was.
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order, validating its line items.
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<LineItem>,
        total_amount: Money,
        shipping_address: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::ZeroQuantity {
                    product_id: item.product_id.to_string(),
                });
            }
        }

        let now = Utc::now();
        Ok(Self {
            id,
            customer_id,
            items,
            total_amount,
            shipping_address: shipping_address.into(),
            payment_method: payment_method.into(),
            status: OrderStatus::Pending,
            reservation_progress: Vec::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    // -- Accessors --

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn reservation_progress(&self) -> &[LineItem] {
        &self.reservation_progress
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // -- Transitions --

    /// Starts (or re-enters) the reservation pass.
    pub fn begin_reservation(&mut self) -> Result<(), OrderError> {
        if !self.status.can_start_reservation() && !self.status.can_resume_reservation() {
            return Err(self.invalid_transition("Reserving"));
        }
        self.status = OrderStatus::Reserving;
        self.touch();
        Ok(())
    }

    /// Records one successfully reserved line item of the current pass.
    pub fn record_reserved(&mut self, item: LineItem) -> Result<(), OrderError> {
        if self.status != OrderStatus::Reserving {
            return Err(self.invalid_transition("Reserving"));
        }
        self.reservation_progress.push(item);
        self.touch();
        Ok(())
    }

    /// Removes and returns the most recently reserved item of the
    /// current pass. Used when compensating in reverse order.
    pub fn pop_reserved(&mut self) -> Option<LineItem> {
        let item = self.reservation_progress.pop();
        if item.is_some() {
            self.touch();
        }
        item
    }

    /// Settles the pass as fully reserved.
    pub fn mark_reserved(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Reserving {
            return Err(self.invalid_transition("Reserved"));
        }
        self.status = OrderStatus::Reserved;
        self.reservation_progress.clear();
        self.touch();
        Ok(())
    }

    /// Settles the pass as failed after compensation of partial work.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if self.status != OrderStatus::Reserving {
            return Err(self.invalid_transition("Failed"));
        }
        self.status = OrderStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.reservation_progress.clear();
        self.touch();
        Ok(())
    }

    /// Confirms the order after a successful payment.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(self.invalid_transition("Confirmed"));
        }
        self.status = OrderStatus::Confirmed;
        self.touch();
        Ok(())
    }

    /// Cancels the order after a failed payment.
    ///
    /// The line items are copied into `reservation_progress` as
    /// pending releases: the compensation handler pops them one by one
    /// as it returns stock to the ledger, so a replay after a partial
    /// failure releases only what is still outstanding.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(self.invalid_transition("Cancelled"));
        }
        self.status = OrderStatus::Cancelled;
        self.failure_reason = Some(reason.into());
        self.reservation_progress = self.items.clone();
        self.touch();
        Ok(())
    }

    /// Returns true while cancelled stock remains to be released.
    pub fn has_pending_releases(&self) -> bool {
        self.status == OrderStatus::Cancelled && !self.reservation_progress.is_empty()
    }

    fn invalid_transition(&self, to: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            from: self.status,
            to,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::ProductId;

    fn sample_order() -> Order {
        Order::new(
            OrderId::new(),
            CustomerId::new(),
            vec![LineItem::new("SKU-001", 2), LineItem::new("SKU-002", 1)],
            Money::from_cents(4500),
            "1 Main St",
            "credit_card",
        )
        .unwrap()
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = sample_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.reservation_progress().is_empty());
        assert!(order.failure_reason().is_none());
    }

    #[test]
    fn test_new_order_rejects_empty_items() {
        let result = Order::new(
            OrderId::new(),
            CustomerId::new(),
            vec![],
            Money::zero(),
            "1 Main St",
            "credit_card",
        );
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn test_new_order_rejects_zero_quantity() {
        let result = Order::new(
            OrderId::new(),
            CustomerId::new(),
            vec![LineItem::new("SKU-001", 0)],
            Money::zero(),
            "1 Main St",
            "credit_card",
        );
        assert!(matches!(result, Err(OrderError::ZeroQuantity { .. })));
    }

    #[test]
    fn test_reservation_lifecycle_success() {
        let mut order = sample_order();
        order.begin_reservation().unwrap();
        assert_eq!(order.status(), OrderStatus::Reserving);

        order
            .record_reserved(LineItem::new("SKU-001", 2))
            .unwrap();
        order
            .record_reserved(LineItem::new("SKU-002", 1))
            .unwrap();
        assert_eq!(order.reservation_progress().len(), 2);

        order.mark_reserved().unwrap();
        assert_eq!(order.status(), OrderStatus::Reserved);
        assert!(order.reservation_progress().is_empty());
    }

    #[test]
    fn test_reservation_lifecycle_failure() {
        let mut order = sample_order();
        order.begin_reservation().unwrap();
        order
            .record_reserved(LineItem::new("SKU-001", 2))
            .unwrap();

        let popped = order.pop_reserved().unwrap();
        assert_eq!(popped.product_id, ProductId::new("SKU-001"));

        order.mark_failed("insufficient stock").unwrap();
        assert_eq!(order.status(), OrderStatus::Failed);
        assert_eq!(order.failure_reason(), Some("insufficient stock"));
    }

    #[test]
    fn test_begin_reservation_is_reentrant() {
        let mut order = sample_order();
        order.begin_reservation().unwrap();
        // Re-entry after a crash mid-pass stays in Reserving.
        order.begin_reservation().unwrap();
        assert_eq!(order.status(), OrderStatus::Reserving);
    }

    #[test]
    fn test_confirm_requires_reserved() {
        let mut order = sample_order();
        assert!(order.confirm().is_err());

        order.begin_reservation().unwrap();
        order.mark_reserved().unwrap();
        order.confirm().unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_cancel_requires_reserved() {
        let mut order = sample_order();
        order.begin_reservation().unwrap();
        order.mark_reserved().unwrap();
        order.cancel("payment failed").unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.failure_reason(), Some("payment failed"));

        // Cancelling queues every line item for release.
        assert!(order.has_pending_releases());
        assert_eq!(order.reservation_progress().len(), 2);
        order.pop_reserved();
        order.pop_reserved();
        assert!(!order.has_pending_releases());

        // Terminal: a second cancel is rejected.
        assert!(order.cancel("again").is_err());
    }

    #[test]
    fn test_cannot_mark_reserved_from_pending() {
        let mut order = sample_order();
        let err = order.mark_reserved().unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }
}
