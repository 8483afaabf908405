//! HTTP API server for the order-processing engine.
//!
//! A thin axum surface over the domain services and read paths, with
//! structured logging (tracing) and Prometheus metrics. Every write runs
//! under a [`CancelSignal`] carrying the configured request timeout.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use domain::{AccountService, InventoryService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use queries::PageLimits;
use sqlx::PgPool;
use store::{CancelSignal, PgStore, TxOptions};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub accounts: AccountService,
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub pool: PgPool,
    pub page_limits: PageLimits,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the services onto `store` using the configured retry policy,
    /// isolation level and limits.
    pub fn new(store: PgStore, config: &Config) -> Self {
        let options = TxOptions::new(config.isolation);
        Self {
            accounts: AccountService::new(store.clone(), config.retry, options),
            inventory: InventoryService::new(store.clone(), config.retry, options),
            orders: OrderService::new(store.clone(), config.retry),
            pool: store.pool().clone(),
            page_limits: config.page_limits,
            request_timeout: config.request_timeout,
        }
    }

    /// Returns a fresh signal that fires once the request timeout elapses.
    pub fn cancel_signal(&self) -> CancelSignal {
        CancelSignal::new().with_timeout(self.request_timeout)
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/accounts",
            get(routes::accounts::list).post(routes::accounts::create),
        )
        .route("/accounts/{id}", get(routes::accounts::get))
        .route("/accounts/{id}/orders", get(routes::accounts::orders))
        .route("/items", get(routes::items::list).post(routes::items::create))
        .route("/items/{id}", get(routes::items::get))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
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
