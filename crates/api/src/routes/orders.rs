//! Order submission and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use domain::{
    CustomerId, InMemoryOrderStore, LineItem, Money, Order, OrderStore,
};
use ledger::InMemoryStockLedger;
use messaging::{
    ConsumerWorker, DeadLetterQueue, Delivery, EventEnvelope, InMemoryDeduplicator,
    InMemoryPublisher, OrderSubmittedData,
};
use saga::{CompensationHandler, ReservationCoordinator};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

type OrderConsumer = ReservationCoordinator<
    InMemoryStockLedger,
    InMemoryOrderStore,
    InMemoryPublisher,
    InMemoryDeduplicator,
>;
type PaymentConsumer = CompensationHandler<
    InMemoryStockLedger,
    InMemoryOrderStore,
    InMemoryPublisher,
    InMemoryDeduplicator,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub ledger: InMemoryStockLedger,
    pub orders: InMemoryOrderStore,
    pub publisher: InMemoryPublisher,
    pub dead_letters: DeadLetterQueue,
    pub order_consumer: ConsumerWorker<OrderConsumer>,
    pub payment_consumer: ConsumerWorker<PaymentConsumer>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct SubmitOrderRequest {
    pub customer_id: Option<String>,
    pub items: Vec<LineItemRequest>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub customer_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<LineItemResponse>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub failure_reason: Option<String>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct DeadLetterResponse {
    pub consumer: String,
    pub event_type: String,
    pub order_id: String,
    pub attempts: u32,
    pub reason: String,
}

fn order_to_response(order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id().to_string(),
        customer_id: order.customer_id().to_string(),
        status: order.status().to_string(),
        items: order
            .items()
            .iter()
            .map(|item| LineItemResponse {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
            })
            .collect(),
        total_cents: order.total_amount().cents(),
        shipping_address: order.shipping_address().to_string(),
        payment_method: order.payment_method().to_string(),
        failure_reason: order.failure_reason().map(String::from),
    }
}

// -- Handlers --

/// POST /orders — submit an order and run it through the reservation saga.
#[tracing::instrument(skip(state, req))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = match &req.customer_id {
        Some(id_str) => {
            let uuid = uuid::Uuid::parse_str(id_str)
                .map_err(|e| ApiError::BadRequest(format!("invalid customer_id: {e}")))?;
            CustomerId::from_uuid(uuid)
        }
        None => CustomerId::new(),
    };

    if req.items.is_empty() {
        return Err(ApiError::BadRequest("order has no items".to_string()));
    }
    if req.items.iter().any(|item| item.quantity == 0) {
        return Err(ApiError::BadRequest(
            "line item quantity must be positive".to_string(),
        ));
    }
    if req.total_cents <= 0 {
        return Err(ApiError::BadRequest(
            "total_cents must be positive".to_string(),
        ));
    }

    let envelope = EventEnvelope::order_submitted(OrderSubmittedData {
        order_id: OrderId::new(),
        customer_id,
        items: req
            .items
            .iter()
            .map(|item| LineItem::new(item.product_id.as_str(), item.quantity))
            .collect(),
        total_amount: Money::from_cents(req.total_cents),
        shipping_address: req.shipping_address,
        payment_method: req.payment_method,
    });
    let order_id = envelope.order_id();

    match state.order_consumer.deliver(&envelope).await {
        Delivery::Handled => {
            let order = state
                .orders
                .get(order_id)
                .await?
                .ok_or_else(|| ApiError::Internal("order missing after reservation".to_string()))?;
            Ok((axum::http::StatusCode::ACCEPTED, Json(order_to_response(&order))))
        }
        Delivery::DeadLettered => Err(ApiError::Internal(
            "order submission could not be processed".to_string(),
        )),
    }
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order_to_response(&order)))
}

/// GET /orders — list orders, optionally filtered by customer.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = match &params.customer_id {
        Some(id_str) => {
            let uuid = uuid::Uuid::parse_str(id_str)
                .map_err(|e| ApiError::BadRequest(format!("invalid customer_id: {e}")))?;
            state
                .orders
                .find_by_customer(CustomerId::from_uuid(uuid))
                .await?
        }
        None => state.orders.list().await?,
    };

    Ok(Json(orders.iter().map(order_to_response).collect()))
}

/// GET /dead-letters — list messages that exhausted their retry budget.
#[tracing::instrument(skip(state))]
pub async fn dead_letters(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<DeadLetterResponse>> {
    let letters = state.dead_letters.entries().await;
    Json(
        letters
            .into_iter()
            .map(|letter| DeadLetterResponse {
                consumer: letter.consumer.to_string(),
                event_type: letter.envelope.event_type().to_string(),
                order_id: letter.envelope.order_id().to_string(),
                attempts: letter.attempts,
                reason: letter.reason,
            })
            .collect(),
    )
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
