//! Per-pass reservation bookkeeping.

use domain::{LineItem, ProductId};

/// Outcome of one line item within a reservation pass.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub product_id: ProductId,
    pub quantity: u32,
    pub reserved: bool,
    pub reason: Option<String>,
}

/// Ephemeral record of one saga pass over an order's line items.
///
/// Lives only for the duration of the pass; it computes the aggregate
/// success flag and remembers which items must be compensated when a
/// later item fails.
#[derive(Debug, Default)]
pub struct ReservationAttempt {
    outcomes: Vec<ItemOutcome>,
}

impl ReservationAttempt {
    /// Starts an empty attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully reserved item.
    pub fn record_reserved(&mut self, item: &LineItem) {
        self.outcomes.push(ItemOutcome {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            reserved: true,
            reason: None,
        });
    }

    /// Records a failed item with its business reason.
    pub fn record_failed(&mut self, item: &LineItem, reason: impl Into<String>) {
        self.outcomes.push(ItemOutcome {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            reserved: false,
            reason: Some(reason.into()),
        });
    }

    /// Returns true when every recorded item reserved successfully.
    pub fn all_reserved(&self) -> bool {
        self.outcomes.iter().all(|o| o.reserved)
    }

    /// Returns the first failure reason, if any item failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .find_map(|o| o.reason.as_deref())
    }

    /// Returns all per-item outcomes in list order.
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }
}
