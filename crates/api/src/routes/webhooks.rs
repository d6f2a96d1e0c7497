//! Inbound event endpoints: payment outcomes and manual stock release.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{CustomerId, Money, ProductId};
use messaging::{Delivery, EventEnvelope, PaymentOutcomeData};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::{AppState, parse_order_id};

#[derive(Deserialize)]
pub struct PaymentOutcomeRequest {
    pub order_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ReleaseRequest {
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub reason: String,
}

#[derive(Serialize)]
pub struct DeliveryResponse {
    pub event_id: String,
    pub delivery: &'static str,
}

fn delivery_response(envelope: &EventEnvelope, delivery: Delivery) -> DeliveryResponse {
    DeliveryResponse {
        event_id: envelope.event_id.to_string(),
        delivery: match delivery {
            Delivery::Handled => "handled",
            Delivery::DeadLettered => "dead-lettered",
        },
    }
}

/// POST /payments/outcome — accept a payment result and run compensation.
#[tracing::instrument(skip(state, req))]
pub async fn payment_outcome(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentOutcomeRequest>,
) -> Result<(axum::http::StatusCode, Json<DeliveryResponse>), ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    let customer_uuid = uuid::Uuid::parse_str(&req.customer_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid customer_id: {e}")))?;

    let envelope = EventEnvelope::payment_outcome(PaymentOutcomeData {
        order_id,
        customer_id: CustomerId::from_uuid(customer_uuid),
        amount: Money::from_cents(req.amount_cents),
        success: req.success,
        transaction_id: req.transaction_id,
        message: req.message,
    });

    let delivery = state.payment_consumer.deliver(&envelope).await;
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(delivery_response(&envelope, delivery)),
    ))
}

/// POST /inventory/release — request a manual release of reserved stock.
#[tracing::instrument(skip(state, req))]
pub async fn release(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReleaseRequest>,
) -> Result<(axum::http::StatusCode, Json<DeliveryResponse>), ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    if req.quantity == 0 {
        return Err(ApiError::BadRequest("release quantity must be positive".to_string()));
    }

    let envelope = EventEnvelope::release_requested(
        order_id,
        ProductId::new(req.product_id.as_str()),
        req.quantity,
        req.reason,
    );

    let delivery = state.payment_consumer.deliver(&envelope).await;
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(delivery_response(&envelope, delivery)),
    ))
}
