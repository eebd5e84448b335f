pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod stores;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::domain::ports::TransactionStore;
use crate::services::confirmation::ConfirmationCoordinator;
use crate::services::stats::StatsAggregator;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub coordinator: ConfirmationCoordinator,
    pub stats: StatsAggregator,
    pub webhook_secret: String,
}

impl AppState {
    pub fn new(store: Arc<dyn TransactionStore>, webhook_secret: impl Into<String>) -> Self {
        Self {
            coordinator: ConfirmationCoordinator::new(store.clone()),
            stats: StatsAggregator::new(store.clone()),
            store,
            webhook_secret: webhook_secret.into(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/transactions", get(handlers::transactions::list_transactions))
        .route(
            "/transactions/export",
            get(handlers::export::export_transactions),
        )
        .route(
            "/transactions/stats/today",
            get(handlers::transactions::today_stats),
        )
        .route(
            "/transactions/:trx_id",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/transactions/:trx_id/confirm/propose",
            post(handlers::transactions::propose_confirmation),
        )
        .route(
            "/transactions/:trx_id/confirm",
            post(handlers::transactions::commit_confirmation),
        )
        .route("/callback", post(handlers::callback::callback))
        .route("/api-docs/openapi.json", get(handlers::openapi_spec))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
