//! Stock item model.

use chrono::{DateTime, Utc};
use domain::ProductId;
use serde::{Deserialize, Serialize};

/// Per-product stock counters.
///
/// Invariant: `available + reserved` is conserved across reserve and
/// release pairs; only an explicit restock changes the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    /// The product this entry tracks.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Units available for new reservations.
    pub available: u32,
    /// Units held for orders awaiting a payment outcome.
    pub reserved: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Creates a new stock item with no reservations.
    pub fn new(product_id: impl Into<ProductId>, name: impl Into<String>, available: u32) -> Self {
        let now = Utc::now();
        Self {
            product_id: product_id.into(),
            name: name.into(),
            available,
            reserved: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if `quantity` units can be reserved.
    pub fn has_available(&self, quantity: u32) -> bool {
        self.available >= quantity
    }

    /// Moves units from available to reserved. Callers check
    /// `has_available` first; this only applies the counter move.
    pub(crate) fn reserve(&mut self, quantity: u32) {
        debug_assert!(self.has_available(quantity));
        self.available -= quantity;
        self.reserved += quantity;
        self.updated_at = Utc::now();
    }

    /// Moves units from reserved back to available. Returns false when
    /// fewer than `quantity` units are reserved.
    pub(crate) fn release(&mut self, quantity: u32) -> bool {
        if self.reserved < quantity {
            return false;
        }
        self.reserved -= quantity;
        self.available += quantity;
        self.updated_at = Utc::now();
        true
    }

    /// Adds newly stocked units.
    pub(crate) fn restock(&mut self, quantity: u32) {
        self.available += quantity;
        self.updated_at = Utc::now();
    }

    /// Total units on hand, the conserved sum.
    pub fn on_hand(&self) -> u32 {
        self.available + self.reserved
    }
}
