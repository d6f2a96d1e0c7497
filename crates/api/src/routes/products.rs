//! Product catalog and stock level endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::ProductId;
use ledger::{StockItem, StockLedger};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct RegisterProductRequest {
    pub product_id: String,
    pub name: String,
    pub available: u32,
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub available: u32,
    pub reserved: u32,
}

impl From<StockItem> for ProductResponse {
    fn from(item: StockItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name,
            available: item.available,
            reserved: item.reserved,
        }
    }
}

/// POST /products — register a product with initial stock.
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    if req.product_id.trim().is_empty() {
        return Err(ApiError::BadRequest("product_id must not be empty".to_string()));
    }

    let item = StockItem::new(req.product_id.as_str(), req.name.as_str(), req.available);
    state.ledger.register(item.clone()).await?;

    Ok((axum::http::StatusCode::CREATED, Json(item.into())))
}

/// GET /products — list all products with stock levels.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let items = state.ledger.list().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — look up one product.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let item = state
        .ledger
        .get(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;

    Ok(Json(item.into()))
}

/// POST /products/:id/restock — add units to available stock.
#[tracing::instrument(skip(state, req))]
pub async fn restock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    if req.quantity == 0 {
        return Err(ApiError::BadRequest("restock quantity must be positive".to_string()));
    }

    let product_id = ProductId::new(id.as_str());
    state.ledger.restock(&product_id, req.quantity).await?;

    let item = state
        .ledger
        .get(&product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;

    Ok(Json(item.into()))
}
