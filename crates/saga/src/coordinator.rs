//! Reservation coordinator.

use async_trait::async_trait;
use common::EventId;
use domain::{LineItem, Order, OrderStatus, OrderStore};
use ledger::{ReserveOutcome, StockLedger};
use messaging::{
    ConsumeError, Deduplicator, EventEnvelope, EventHandler, EventPublisher, OrderSubmittedData,
    topics,
};

use crate::attempt::ReservationAttempt;
use crate::error::SagaError;

/// Drives the per-order reservation state machine.
///
/// Consumes order submissions and reserves every line item in list
/// order through the stock ledger. The pass is all-or-nothing: if any
/// item fails for a business reason, the items reserved earlier in the
/// same pass are released in reverse order, and every item's outcome
/// event carries `success = false` with the same reason, so consumers
/// observe a single consistent outcome per order.
///
/// Ledger mutations and outcome emission are not one atomic
/// transaction. Progress is persisted on the order record after every
/// ledger call, and the processed event ID is recorded only after the
/// outcomes are published, so a crash at any point is recovered by
/// redelivery: an interrupted pass is rolled back and re-run, a
/// settled order re-emits its outcomes.
pub struct ReservationCoordinator<L, O, P, D> {
    ledger: L,
    orders: O,
    publisher: P,
    dedup: D,
}

impl<L, O, P, D> ReservationCoordinator<L, O, P, D>
where
    L: StockLedger,
    O: OrderStore,
    P: EventPublisher,
    D: Deduplicator,
{
    /// Creates a new coordinator over the injected collaborators.
    pub fn new(ledger: L, orders: O, publisher: P, dedup: D) -> Self {
        Self {
            ledger,
            orders,
            publisher,
            dedup,
        }
    }

    /// Processes one order-submission event to completion.
    #[tracing::instrument(skip(self, data), fields(order_id = %data.order_id, %event_id))]
    pub async fn process_submission(
        &self,
        event_id: EventId,
        data: &OrderSubmittedData,
    ) -> Result<(), SagaError> {
        if self.dedup.seen(event_id).await {
            metrics::counter!("duplicate_events_total").increment(1);
            tracing::debug!("duplicate submission, skipping");
            return Ok(());
        }

        let start = std::time::Instant::now();
        metrics::counter!("reservations_total").increment(1);

        let mut order = match self.orders.get(data.order_id).await? {
            Some(order) => order,
            // First sight of this order on this consumer: materialize
            // it from the event payload.
            None => Order::new(
                data.order_id,
                data.customer_id,
                data.items.clone(),
                data.total_amount,
                data.shipping_address.clone(),
                data.payment_method.clone(),
            )?,
        };

        if order.status().reservation_settled() {
            // A previous delivery settled this order but crashed before
            // recording the event ID. Re-emit the outcomes so no
            // consumer is left without one, then absorb the event.
            tracing::info!(status = %order.status(), "order already settled, re-emitting outcomes");
            self.emit_settled_outcomes(&order).await?;
            self.dedup.mark_seen(event_id).await;
            return Ok(());
        }

        if order.status().can_resume_reservation() {
            // A previous pass was interrupted mid-flight. Roll back its
            // recorded progress before starting over.
            tracing::warn!(
                reserved = order.reservation_progress().len(),
                "re-entering interrupted pass, rolling back partial work"
            );
            self.rollback_progress(&mut order).await?;
        }

        order.begin_reservation()?;
        self.orders.put(order.clone()).await?;

        let attempt = self.reserve_items(&mut order).await?;

        if attempt.all_reserved() {
            order.mark_reserved()?;
            self.orders.put(order.clone()).await?;
            self.emit_outcomes(&order, true, "inventory reserved").await?;
            tracing::info!("order reserved");
        } else {
            // A later item failed; undo the earlier reservations of
            // this pass in reverse order.
            let reason = attempt
                .failure_reason()
                .unwrap_or("reservation failed")
                .to_string();
            self.rollback_progress(&mut order).await?;
            order.mark_failed(&reason)?;
            self.orders.put(order.clone()).await?;
            self.emit_outcomes(&order, false, &reason).await?;
            metrics::counter!("reservations_failed_total").increment(1);
            tracing::warn!(%reason, "order reservation failed");
        }

        self.dedup.mark_seen(event_id).await;
        metrics::histogram!("reservation_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Reserves each line item in list order, stopping at the first
    /// business failure. Progress is persisted after every successful
    /// reservation so an interrupted pass can be rolled back.
    async fn reserve_items(&self, order: &mut Order) -> Result<ReservationAttempt, SagaError> {
        let mut attempt = ReservationAttempt::new();
        let items: Vec<LineItem> = order.items().to_vec();

        for item in items {
            match self.ledger.try_reserve(&item.product_id, item.quantity).await? {
                ReserveOutcome::Reserved => {
                    attempt.record_reserved(&item);
                    order.record_reserved(item)?;
                    self.orders.put(order.clone()).await?;
                }
                ReserveOutcome::InsufficientStock {
                    available,
                    requested,
                } => {
                    attempt.record_failed(
                        &item,
                        format!(
                            "insufficient stock for product {}: available {available}, requested {requested}",
                            item.product_id
                        ),
                    );
                    break;
                }
                ReserveOutcome::ProductNotFound => {
                    attempt
                        .record_failed(&item, format!("product not found: {}", item.product_id));
                    break;
                }
            }
        }

        Ok(attempt)
    }

    /// Releases the order's recorded progress in reverse reservation
    /// order, persisting after each release.
    async fn rollback_progress(&self, order: &mut Order) -> Result<(), SagaError> {
        while let Some(item) = order.reservation_progress().last().cloned() {
            self.ledger.release(&item.product_id, item.quantity).await?;
            order.pop_reserved();
            self.orders.put(order.clone()).await?;
        }
        Ok(())
    }

    /// Emits one outcome event per line item, all with the same flag
    /// and message.
    async fn emit_outcomes(
        &self,
        order: &Order,
        success: bool,
        message: &str,
    ) -> Result<(), SagaError> {
        for item in order.items() {
            let envelope = EventEnvelope::inventory_outcome(
                order.id(),
                item.product_id.clone(),
                item.quantity,
                success,
                message,
            );
            self.publisher
                .publish(topics::INVENTORY_EVENTS, order.id(), envelope)
                .await?;
        }
        Ok(())
    }

    /// Re-derives and emits outcomes for an already settled order.
    async fn emit_settled_outcomes(&self, order: &Order) -> Result<(), SagaError> {
        match order.status() {
            OrderStatus::Failed => {
                let reason = order
                    .failure_reason()
                    .unwrap_or("reservation failed")
                    .to_string();
                self.emit_outcomes(order, false, &reason).await
            }
            _ => self.emit_outcomes(order, true, "inventory reserved").await,
        }
    }
}

#[async_trait]
impl<L, O, P, D> EventHandler for ReservationCoordinator<L, O, P, D>
where
    L: StockLedger,
    O: OrderStore,
    P: EventPublisher,
    D: Deduplicator,
{
    fn consumer_name(&self) -> &'static str {
        "reservation-coordinator"
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ConsumeError> {
        match &envelope.event {
            messaging::EventKind::OrderSubmitted(data) => self
                .process_submission(envelope.event_id, data)
                .await
                .map_err(ConsumeError::from),
            _ => {
                tracing::debug!(event_type = envelope.event_type(), "ignoring event kind");
                Ok(())
            }
        }
    }
}
