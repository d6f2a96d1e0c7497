//! Compensation handler.

use async_trait::async_trait;
use common::EventId;
use domain::{Order, OrderStore};
use ledger::StockLedger;
use messaging::{
    ConsumeError, Deduplicator, EventEnvelope, EventHandler, EventPublisher, PaymentOutcomeData,
    ReleaseData, topics,
};

use crate::error::SagaError;

/// Consumes downstream payment outcomes and undoes reservations when
/// payment fails.
///
/// On success the order moves `Reserved → Confirmed` with no ledger
/// change: the reserved stock is now permanently consumed and a
/// separate fulfillment step decrements it later. On failure the
/// handler fetches the order's line items from the store, releases
/// each through the ledger, moves the order to `Cancelled`, and emits
/// a release confirmation per item. Replays are absorbed by the
/// deduplicator and by the status precondition: stock is only released
/// while the order is still `Reserved` (or still carries pending
/// releases from an interrupted cancellation).
pub struct CompensationHandler<L, O, P, D> {
    ledger: L,
    orders: O,
    publisher: P,
    dedup: D,
}

impl<L, O, P, D> CompensationHandler<L, O, P, D>
where
    L: StockLedger,
    O: OrderStore,
    P: EventPublisher,
    D: Deduplicator,
{
    /// Creates a new handler over the injected collaborators.
    pub fn new(ledger: L, orders: O, publisher: P, dedup: D) -> Self {
        Self {
            ledger,
            orders,
            publisher,
            dedup,
        }
    }

    /// Processes one payment outcome.
    #[tracing::instrument(skip(self, data), fields(order_id = %data.order_id, %event_id))]
    pub async fn process_payment_outcome(
        &self,
        event_id: EventId,
        data: &PaymentOutcomeData,
    ) -> Result<(), SagaError> {
        if self.dedup.seen(event_id).await {
            metrics::counter!("duplicate_events_total").increment(1);
            tracing::debug!("duplicate payment outcome, skipping");
            return Ok(());
        }

        let mut order = self
            .orders
            .get(data.order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(data.order_id))?;

        if data.success {
            if order.status().can_confirm() {
                order.confirm()?;
                self.orders.put(order).await?;
                metrics::counter!("orders_confirmed_total").increment(1);
                tracing::info!("order confirmed");
            } else {
                // Already confirmed by a prior delivery, or the order
                // never reached Reserved; either way nothing to do.
                tracing::debug!(status = %order.status(), "payment success with no transition");
            }
        } else {
            let reason = if data.message.is_empty() {
                "payment failed".to_string()
            } else {
                format!("payment failed: {}", data.message)
            };

            if order.status().can_cancel() {
                order.cancel(&reason)?;
                self.orders.put(order.clone()).await?;
                self.drain_pending_releases(&mut order, &reason).await?;
                metrics::counter!("orders_cancelled_total").increment(1);
                tracing::info!(%reason, "order cancelled, reserved stock released");
            } else if order.has_pending_releases() {
                // A prior delivery cancelled the order but was
                // interrupted before releasing everything.
                tracing::warn!(
                    pending = order.reservation_progress().len(),
                    "resuming interrupted cancellation"
                );
                self.drain_pending_releases(&mut order, &reason).await?;
            } else {
                // Replay for an order already compensated, or a payment
                // failure for an order that never held stock.
                tracing::debug!(status = %order.status(), "payment failure with no stock to release");
            }
        }

        self.dedup.mark_seen(event_id).await;
        Ok(())
    }

    /// Processes an explicit release request (administrative path).
    #[tracing::instrument(skip(self, data), fields(order_id = %data.order_id, %event_id))]
    pub async fn process_release_request(
        &self,
        event_id: EventId,
        data: &ReleaseData,
    ) -> Result<(), SagaError> {
        if self.dedup.seen(event_id).await {
            metrics::counter!("duplicate_events_total").increment(1);
            return Ok(());
        }

        self.ledger.release(&data.product_id, data.quantity).await?;
        self.publisher
            .publish(
                topics::INVENTORY_EVENTS,
                data.order_id,
                EventEnvelope::release_confirmed(
                    data.order_id,
                    data.product_id.clone(),
                    data.quantity,
                    &data.reason,
                ),
            )
            .await?;

        self.dedup.mark_seen(event_id).await;
        Ok(())
    }

    /// Releases the order's pending items one by one, persisting after
    /// each so an interrupted cancellation never double-releases.
    async fn drain_pending_releases(
        &self,
        order: &mut Order,
        reason: &str,
    ) -> Result<(), SagaError> {
        while let Some(item) = order.reservation_progress().last().cloned() {
            self.ledger.release(&item.product_id, item.quantity).await?;
            order.pop_reserved();
            self.orders.put(order.clone()).await?;
            self.publisher
                .publish(
                    topics::INVENTORY_EVENTS,
                    order.id(),
                    EventEnvelope::release_confirmed(
                        order.id(),
                        item.product_id,
                        item.quantity,
                        reason,
                    ),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<L, O, P, D> EventHandler for CompensationHandler<L, O, P, D>
where
    L: StockLedger,
    O: OrderStore,
    P: EventPublisher,
    D: Deduplicator,
{
    fn consumer_name(&self) -> &'static str {
        "compensation-handler"
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ConsumeError> {
        match &envelope.event {
            messaging::EventKind::PaymentOutcome(data) => self
                .process_payment_outcome(envelope.event_id, data)
                .await
                .map_err(ConsumeError::from),
            messaging::EventKind::InventoryReleaseRequested(data) => self
                .process_release_request(envelope.event_id, data)
                .await
                .map_err(ConsumeError::from),
            _ => {
                tracing::debug!(event_type = envelope.event_type(), "ignoring event kind");
                Ok(())
            }
        }
    }
}
