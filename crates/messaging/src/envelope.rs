//! Event envelope and the closed event variant set.

use chrono::{DateTime, Utc};
use common::{EventId, OrderId};
use domain::{CustomerId, LineItem, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::topics;

/// An immutable published event: dedup key, creation time, and the
/// typed payload. Consumed possibly more than once (at-least-once
/// delivery); a single decoder dispatches on the `eventType` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Globally unique dedup key.
    pub event_id: EventId,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// The typed event payload.
    #[serde(flatten)]
    pub event: EventKind,
}

/// The closed set of event kinds crossing the system's channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "payload")]
pub enum EventKind {
    /// An order was created and submitted for reservation.
    OrderSubmitted(OrderSubmittedData),

    /// Per-item outcome of a reservation pass.
    InventoryOutcome(InventoryOutcomeData),

    /// Result of the downstream payment attempt.
    PaymentOutcome(PaymentOutcomeData),

    /// Request to release reserved stock for one item.
    InventoryReleaseRequested(ReleaseData),

    /// Confirmation that reserved stock was released.
    InventoryReleaseConfirmed(ReleaseData),
}

/// Payload of `OrderSubmitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmittedData {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<LineItem>,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: String,
}

/// Payload of `InventoryOutcome`, one per line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryOutcomeData {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub success: bool,
    pub message: String,
}

/// Payload of `PaymentOutcome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcomeData {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: String,
}

/// Payload of the release request/confirmation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseData {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub reason: String,
}

impl EventEnvelope {
    /// Wraps an event kind with a fresh event ID and timestamp.
    pub fn new(event: EventKind) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Creates an `OrderSubmitted` envelope.
    pub fn order_submitted(data: OrderSubmittedData) -> Self {
        Self::new(EventKind::OrderSubmitted(data))
    }

    /// Creates an `InventoryOutcome` envelope.
    pub fn inventory_outcome(
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        success: bool,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::InventoryOutcome(InventoryOutcomeData {
            order_id,
            product_id,
            quantity,
            success,
            message: message.into(),
        }))
    }

    /// Creates a `PaymentOutcome` envelope.
    pub fn payment_outcome(data: PaymentOutcomeData) -> Self {
        Self::new(EventKind::PaymentOutcome(data))
    }

    /// Creates an `InventoryReleaseRequested` envelope.
    pub fn release_requested(
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::InventoryReleaseRequested(ReleaseData {
            order_id,
            product_id,
            quantity,
            reason: reason.into(),
        }))
    }

    /// Creates an `InventoryReleaseConfirmed` envelope.
    pub fn release_confirmed(
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::InventoryReleaseConfirmed(ReleaseData {
            order_id,
            product_id,
            quantity,
            reason: reason.into(),
        }))
    }

    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self.event {
            EventKind::OrderSubmitted(_) => "OrderSubmitted",
            EventKind::InventoryOutcome(_) => "InventoryOutcome",
            EventKind::PaymentOutcome(_) => "PaymentOutcome",
            EventKind::InventoryReleaseRequested(_) => "InventoryReleaseRequested",
            EventKind::InventoryReleaseConfirmed(_) => "InventoryReleaseConfirmed",
        }
    }

    /// Returns the order this event belongs to: the partitioning key
    /// that preserves per-order delivery ordering.
    pub fn order_id(&self) -> OrderId {
        match &self.event {
            EventKind::OrderSubmitted(data) => data.order_id,
            EventKind::InventoryOutcome(data) => data.order_id,
            EventKind::PaymentOutcome(data) => data.order_id,
            EventKind::InventoryReleaseRequested(data) => data.order_id,
            EventKind::InventoryReleaseConfirmed(data) => data.order_id,
        }
    }

    /// Returns the logical channel this event is published on.
    pub fn topic(&self) -> &'static str {
        match self.event {
            EventKind::OrderSubmitted(_) => topics::ORDER_EVENTS,
            EventKind::InventoryOutcome(_)
            | EventKind::InventoryReleaseRequested(_)
            | EventKind::InventoryReleaseConfirmed(_) => topics::INVENTORY_EVENTS,
            EventKind::PaymentOutcome(_) => topics::PAYMENT_EVENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> EventEnvelope {
        EventEnvelope::order_submitted(OrderSubmittedData {
            order_id: OrderId::new(),
            customer_id: CustomerId::new(),
            items: vec![LineItem::new("SKU-001", 2)],
            total_amount: Money::from_cents(2000),
            shipping_address: "1 Main St".to_string(),
            payment_method: "credit_card".to_string(),
        })
    }

    #[test]
    fn test_event_type_and_topic() {
        let order_id = OrderId::new();

        let e = submitted();
        assert_eq!(e.event_type(), "OrderSubmitted");
        assert_eq!(e.topic(), topics::ORDER_EVENTS);

        let e = EventEnvelope::inventory_outcome(order_id, "SKU-001".into(), 2, true, "reserved");
        assert_eq!(e.event_type(), "InventoryOutcome");
        assert_eq!(e.topic(), topics::INVENTORY_EVENTS);
        assert_eq!(e.order_id(), order_id);

        let e = EventEnvelope::payment_outcome(PaymentOutcomeData {
            order_id,
            customer_id: CustomerId::new(),
            amount: Money::from_cents(2000),
            success: false,
            transaction_id: None,
            message: "card declined".to_string(),
        });
        assert_eq!(e.event_type(), "PaymentOutcome");
        assert_eq!(e.topic(), topics::PAYMENT_EVENTS);

        let e = EventEnvelope::release_requested(order_id, "SKU-001".into(), 2, "admin");
        assert_eq!(e.event_type(), "InventoryReleaseRequested");
        assert_eq!(e.topic(), topics::INVENTORY_EVENTS);

        let e = EventEnvelope::release_confirmed(order_id, "SKU-001".into(), 2, "payment failed");
        assert_eq!(e.event_type(), "InventoryReleaseConfirmed");
        assert_eq!(e.topic(), topics::INVENTORY_EVENTS);
    }

    #[test]
    fn test_tagged_encoding_roundtrip() {
        let envelope = submitted();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["eventType"], "OrderSubmitted");
        assert!(json["payload"]["items"].is_array());
        assert!(json["event_id"].is_string());

        let decoded: EventEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.event_id, envelope.event_id);
        assert_eq!(decoded.order_id(), envelope.order_id());
    }

    #[test]
    fn test_fresh_envelopes_get_unique_event_ids() {
        assert_ne!(submitted().event_id, submitted().event_id);
    }
}
