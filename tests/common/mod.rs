#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bigdecimal::BigDecimal;
use tower::ServiceExt;

use paydesk_core::domain::status::TrxStatus;
use paydesk_core::domain::transaction::{Transaction, TrxType};
use paydesk_core::stores::memory::InMemoryTransactionStore;
use paydesk_core::{create_app, AppState};

pub const TEST_SECRET: &str = "test-channel-secret";

pub fn setup_app() -> (Router, Arc<InMemoryTransactionStore>) {
    let store = Arc::new(InMemoryTransactionStore::new());
    let state = AppState::new(store.clone(), TEST_SECRET);
    (create_app(state), store)
}

pub fn payout(trx_id: &str, amount: &str, status: TrxStatus) -> Transaction {
    let mut tx = Transaction::new(
        trx_id,
        TrxType::Payout,
        amount.parse::<BigDecimal>().unwrap(),
        "INR",
    );
    tx.trx_method = Some("UPI".to_string());
    tx.status = status;
    if status.is_terminal() {
        tx.completed_at = Some(tx.updated_at);
    }
    tx
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    into_json(response).await
}

pub async fn get_raw(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    into_json(response).await
}

pub async fn post_signed(
    app: &Router,
    uri: &str,
    body: String,
    signature: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-channel-signature", signature)
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    into_json(response).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}
