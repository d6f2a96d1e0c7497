//! Logical event channels.
//!
//! All channels are partitioned by order ID, so events for one order
//! are delivered in publish order while unrelated orders interleave
//! freely.

/// Order submissions.
pub const ORDER_EVENTS: &str = "order-events";

/// Reservation outcomes and release request/confirmation events.
pub const INVENTORY_EVENTS: &str = "inventory-events";

/// Payment outcomes.
pub const PAYMENT_EVENTS: &str = "payment-events";
