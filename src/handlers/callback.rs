//! Channel callback: the non-human confirmation path.
//!
//! The payout channel reports its terminal outcome here. The request is
//! authenticated with an HMAC-SHA256 signature over the raw body, and the
//! status change rides the same guarded `transition` primitive the manual
//! confirmation uses, with `expected` set to the record's current in-flight
//! status.

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::domain::status::TrxStatus;
use crate::domain::transaction::TrxUpdate;
use crate::error::AppError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-channel-signature";

#[derive(Debug, Deserialize)]
pub struct CallbackPayload {
    pub trx_id: String,
    /// Terminal outcome: a canonical code or a legacy synonym ("1"/"0").
    pub status: String,
    pub channel_trx_id: Option<String>,
    pub res_code: Option<String>,
    pub res_msg: Option<String>,
    pub reason: Option<String>,
}

/// Hex HMAC-SHA256 of `body` under `secret`. Channel simulators and the
/// integration tests sign their payloads with this.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn verify_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing channel signature".to_string()))?;
    let provided = hex::decode(provided)
        .map_err(|_| AppError::Unauthorized("malformed channel signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("invalid webhook secret".to_string()))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| AppError::Unauthorized("channel signature mismatch".to_string()))
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    verify_signature(&state.webhook_secret, &headers, body.as_bytes())?;

    let payload: CallbackPayload = serde_json::from_str(&body)
        .map_err(|err| AppError::Validation(format!("invalid callback payload: {}", err)))?;

    let outcome = TrxStatus::parse(&payload.status).ok_or_else(|| {
        AppError::Validation(format!("unknown callback status '{}'", payload.status))
    })?;
    if !matches!(outcome, TrxStatus::Success | TrxStatus::Failed) {
        return Err(AppError::Validation(format!(
            "callback status must resolve to success or failed, got {}",
            outcome
        )));
    }

    let current = state.store.get(&payload.trx_id).await?;
    if current.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "transaction {} is already {}",
            current.trx_id, current.status
        )));
    }

    let update = TrxUpdate {
        channel_trx_id: payload.channel_trx_id,
        res_code: payload.res_code,
        res_msg: payload.res_msg,
        reason: payload.reason,
        ..Default::default()
    };
    let updated = state
        .store
        .transition(&payload.trx_id, current.status, outcome, update)
        .await?;

    tracing::info!(
        trx_id = %updated.trx_id,
        outcome = %outcome,
        "channel callback applied"
    );
    Ok(Json(super::transactions::TransactionView::from(&updated)))
}
