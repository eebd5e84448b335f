pub mod callback;
pub mod export;
pub mod transactions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus),
        (status = 503, description = "Store is unreachable", body = HealthStatus)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    let response = HealthStatus {
        status: if store_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_status.to_string(),
    };

    let status_code = if store_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::today_stats,
        transactions::propose_confirmation,
        transactions::commit_confirmation,
        export::export_transactions,
    ),
    components(schemas(
        HealthStatus,
        transactions::TransactionView,
        transactions::TransactionListResponse,
        transactions::ConfirmRequest,
        crate::services::confirmation::ConfirmationPreview,
        crate::services::stats::DailyStats,
    )),
    tags(
        (name = "Transactions", description = "Payout transaction lifecycle and confirmation"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
