//! HTTP API server with observability for the reservation saga.
//!
//! Provides REST endpoints for order submission, product stock
//! management, and payment outcome ingestion, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::InMemoryOrderStore;
use ledger::InMemoryStockLedger;
use messaging::{
    ConsumerWorker, DeadLetterQueue, InMemoryDeduplicator, InMemoryPublisher, RetryPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;
use saga::{CompensationHandler, ReservationCoordinator};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::submit))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/products", post(routes::products::register))
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/products/{id}/restock", post(routes::products::restock))
        .route("/payments/outcome", post(routes::webhooks::payment_outcome))
        .route("/inventory/release", post(routes::webhooks::release))
        .route("/dead-letters", get(routes::orders::dead_letters))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with in-memory stores and
/// both saga consumers wired to a shared dead-letter queue.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let ledger = InMemoryStockLedger::new();
    let orders = InMemoryOrderStore::new();
    let publisher = InMemoryPublisher::new();
    let dead_letters = DeadLetterQueue::new();
    let policy = RetryPolicy {
        max_attempts: config.retry_max_attempts,
        base_delay: config.retry_base_delay,
        ..RetryPolicy::default()
    };

    let order_consumer = ConsumerWorker::new(
        ReservationCoordinator::new(
            ledger.clone(),
            orders.clone(),
            publisher.clone(),
            InMemoryDeduplicator::with_retention(config.dedup_retention),
        ),
        policy.clone(),
        dead_letters.clone(),
    );
    let payment_consumer = ConsumerWorker::new(
        CompensationHandler::new(
            ledger.clone(),
            orders.clone(),
            publisher.clone(),
            InMemoryDeduplicator::with_retention(config.dedup_retention),
        ),
        policy,
        dead_letters.clone(),
    );

    Arc::new(AppState {
        ledger,
        orders,
        publisher,
        dead_letters,
        order_consumer,
        payment_consumer,
    })
}
