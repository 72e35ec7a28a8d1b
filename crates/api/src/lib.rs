//! HTTP API server with observability for the warehouse services.
//!
//! Provides REST endpoints for inventory, order fulfillment and reports,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{OrderStore, ReportService, StockLedger};
use fulfillment::FulfillmentCoordinator;
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{inventory, orders, reports};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let v1 = Router::new()
        .route(
            "/inventory",
            get(inventory::list::<S>).post(inventory::create::<S>),
        )
        .route(
            "/inventory/{sku}",
            get(inventory::get::<S>)
                .put(inventory::update::<S>)
                .delete(inventory::delete::<S>),
        )
        .route("/inventory/{sku}/unique", get(inventory::check_unique::<S>))
        .route("/inventory/{sku}/restock", post(inventory::restock::<S>))
        .route("/orders", get(orders::list::<S>).post(orders::fulfill::<S>))
        .route(
            "/orders/{id}",
            get(orders::get::<S>)
                .put(orders::update::<S>)
                .delete(orders::delete::<S>),
        )
        .route("/reports/inventory", get(reports::inventory::<S>))
        .route("/reports/sales", get(reports::sales::<S>));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/v1", v1)
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

/// Wires the ledger, order store, coordinator and reports over the given stores.
pub fn create_default_state<S: RecordStore + Clone + 'static>(
    stock_store: S,
    order_store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let retry = config.retry_policy();
    let ledger = StockLedger::with_retry_policy(stock_store, retry);
    let orders = OrderStore::with_retry_policy(order_store, retry);
    let coordinator = FulfillmentCoordinator::new(ledger.clone(), orders.clone());
    let reports = ReportService::new(ledger.clone(), orders.clone())
        .with_low_stock_threshold(config.low_stock_threshold);

    Arc::new(AppState {
        ledger,
        orders,
        coordinator,
        reports,
    })
}
